//! Whole-module assembly emission.
//!
//! Serialises every symbol of a [`Context`] - data first, then functions,
//! in definition order - to one UTF-8 buffer of AT&T assembly, wrapped in
//! the module prologue (`.file`) and epilogue (`.ident`, GNU-stack note).
//! When the module defines `main`, a `_start` stub is appended that calls
//! it and exits with its result, so the output links with `ld` alone.

use tracing::debug;

use rillc_ir::{Context, Scalar, SymbolKind, TypeId, Value};

use crate::directives::{self, SymbolType};
use crate::lower::select_function;
use crate::x64::gpr::Gpr;
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::operand::X64Operand;

/// Emit the whole module to an assembly buffer.
pub fn emit_module(context: &Context, source_path: &str) -> String {
    let mut buffer = String::new();
    directives::file(&mut buffer, source_path);
    buffer.push('\n');

    for symbol in context.symbols() {
        if let SymbolKind::Data(value) = &symbol.kind {
            emit_data_symbol(&mut buffer, context, symbol.name.as_str(), symbol.ty, value);
        }
    }

    let mut has_main = false;
    for symbol in context.symbols() {
        if let SymbolKind::Code(function) = &symbol.kind {
            has_main |= function.name.eq_str("main");
            let selected = select_function(context, function);
            emit_function(&mut buffer, context, selected.name.as_str(), &selected.code);
        }
    }

    if has_main {
        emit_start_stub(&mut buffer, context);
    }

    directives::ident(&mut buffer, concat!("rillc ", env!("CARGO_PKG_VERSION")));
    directives::noexecstack(&mut buffer);

    debug!(bytes = buffer.len(), "emitted module");
    buffer
}

fn emit_function(
    buffer: &mut String,
    context: &Context,
    name: &str,
    code: &[X64Instruction],
) {
    directives::text(buffer);
    directives::globl(buffer, name);
    directives::symbol_type(buffer, name, SymbolType::Function);
    directives::label(buffer, name);
    for instruction in code {
        instruction.render(buffer, context);
    }
    directives::size_label_relative(buffer, name);
    buffer.push('\n');
}

/// The process entry point: call `main`, pass its result to the `exit`
/// system call.
fn emit_start_stub(buffer: &mut String, context: &Context) {
    let main_label = context
        .label_of(rillc_util::symbol::SYM_MAIN)
        .expect("main has no label");
    let code = [
        X64Instruction::Call { target: X64Operand::Label(main_label) },
        X64Instruction::Mov {
            size: OperandSize::Long,
            dst: X64Operand::Gpr(Gpr::Rdi),
            src: X64Operand::Gpr(Gpr::Rax),
        },
        X64Instruction::Mov {
            size: OperandSize::Quad,
            dst: X64Operand::Gpr(Gpr::Rax),
            src: X64Operand::Immediate(60),
        },
        X64Instruction::Syscall,
    ];
    emit_function(buffer, context, "_start", &code);
}

fn emit_data_symbol(
    buffer: &mut String,
    context: &Context,
    name: &str,
    ty: TypeId,
    value: &Value,
) {
    let size = context.types.size_of(ty);
    let align = context.types.align_of(ty);

    if is_initialized(context, value) {
        directives::data(buffer);
    } else {
        directives::bss(buffer);
    }
    directives::globl(buffer, name);
    directives::balign(buffer, align);
    directives::symbol_type(buffer, name, SymbolType::Object);
    directives::size(buffer, name, size);
    directives::label(buffer, name);
    if is_initialized(context, value) {
        emit_value(buffer, context, ty, value);
    } else {
        directives::zero(buffer, size);
    }
    buffer.push('\n');
}

fn is_initialized(context: &Context, value: &Value) -> bool {
    match value {
        Value::Scalar(Scalar::Uninitialized) => false,
        Value::Scalar(_) => true,
        Value::Tuple(tuple) => tuple.elements.iter().all(|element| match element {
            rillc_ir::Operand::Immediate(Scalar::Uninitialized) => false,
            rillc_ir::Operand::Constant(id) => {
                is_initialized(context, &context.constants_at(*id).value)
            }
            _ => true,
        }),
    }
}

/// Write one value's bytes, interleaving the tuple layout's padding as
/// `.zero` runs.
fn emit_value(buffer: &mut String, context: &Context, ty: TypeId, value: &Value) {
    match value {
        Value::Scalar(scalar) => emit_scalar(buffer, context.types.size_of(ty), *scalar),
        Value::Tuple(tuple) => {
            let layout = context.types.tuple_layout(ty);
            debug_assert_eq!(layout.fields.len(), tuple.elements.len());
            let mut cursor = 0u64;
            for (element, (field_ty, offset)) in tuple.elements.iter().zip(&layout.fields) {
                if *offset > cursor {
                    directives::zero(buffer, offset - cursor);
                }
                emit_element(buffer, context, *field_ty, element);
                cursor = offset + context.types.size_of(*field_ty);
            }
            if layout.size > cursor {
                directives::zero(buffer, layout.size - cursor);
            }
        }
    }
}

fn emit_element(buffer: &mut String, context: &Context, ty: TypeId, element: &rillc_ir::Operand) {
    match element {
        rillc_ir::Operand::Immediate(scalar) => {
            emit_scalar(buffer, context.types.size_of(ty), *scalar)
        }
        rillc_ir::Operand::Constant(id) => {
            emit_value(buffer, context, ty, &context.constants_at(*id).value)
        }
        other => panic!("global data may not reference {other:?}"),
    }
}

fn emit_scalar(buffer: &mut String, size: u64, scalar: Scalar) {
    if matches!(scalar, Scalar::Uninitialized) {
        directives::zero(buffer, size);
        return;
    }
    let value = scalar.as_i64();
    match size {
        1 => directives::byte(buffer, value),
        2 => directives::short(buffer, value),
        4 => directives::long(buffer, value),
        8 => directives::quad(buffer, value),
        _ => panic!("no data directive for a {size}-byte scalar"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rillc_ir::{Function, Instruction, Operand, ScalarKind, Tuple};
    use rillc_util::Symbol;

    fn module_with_main(body: impl FnOnce(&mut Context, &mut Function)) -> Context {
        let mut context = Context::new();
        let i32_ty = context.types.scalar(ScalarKind::I32);
        let name = Symbol::intern("main");
        let fn_ty = context.types.intern_function(i32_ty, vec![]);
        let mut function = Function::new(name, i32_ty);
        body(&mut context, &mut function);
        context.labels_insert(name);
        context.define_function(name, fn_ty, function);
        context
    }

    #[test]
    fn module_has_prologue_and_epilogue_directives() {
        let context = module_with_main(|_, function| {
            function.append(Instruction::Ret {
                value: Operand::Immediate(Scalar::I32(0)),
            });
        });
        let assembly = emit_module(&context, "demo.rill");
        assert!(assembly.starts_with("\t.file\t\"demo.rill\"\n"));
        assert!(assembly.contains("\t.ident\t\"rillc "));
        assert!(assembly.ends_with("\t.section\t.note.GNU-stack,\"\",@progbits\n"));
    }

    #[test]
    fn functions_carry_type_and_size_directives() {
        let context = module_with_main(|_, function| {
            function.append(Instruction::Ret {
                value: Operand::Immediate(Scalar::I32(0)),
            });
        });
        let assembly = emit_module(&context, "demo.rill");
        assert!(assembly.contains("\t.globl\tmain\n"));
        assert!(assembly.contains("\t.type\tmain, @function\n"));
        assert!(assembly.contains("main:\n"));
        assert!(assembly.contains("\t.size\tmain, .-main\n"));
    }

    #[test]
    fn main_gets_a_start_stub() {
        let context = module_with_main(|_, function| {
            function.append(Instruction::Ret {
                value: Operand::Immediate(Scalar::I32(7)),
            });
        });
        let assembly = emit_module(&context, "demo.rill");
        assert!(assembly.contains("_start:\n"));
        assert!(assembly.contains("\tcall\tmain\n"));
        assert!(assembly.contains("\tmovq\t$60, %rax\n"));
        assert!(assembly.contains("\tsyscall\n"));
    }

    #[test]
    fn empty_body_compiles_to_a_stub() {
        let context = module_with_main(|_, function| {
            function.append(Instruction::Ret {
                value: Operand::Immediate(Scalar::I32(0)),
            });
        });
        let assembly = emit_module(&context, "demo.rill");
        // Prologue, result, epilogue - in order.
        let main_at = assembly.find("main:\n").unwrap();
        let body = &assembly[main_at..];
        let positions: Vec<usize> = [
            "\tpushq\t%rbp\n",
            "\tmovq\t%rsp, %rbp\n",
            "\tmovl\t$0, %eax\n",
            "\tmovq\t%rbp, %rsp\n",
            "\tpopq\t%rbp\n",
            "\tret\n",
        ]
        .iter()
        .map(|needle| body.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn initialized_scalar_data_goes_to_data_section() {
        let mut context = Context::new();
        let i32_ty = context.types.scalar(ScalarKind::I32);
        let name = Symbol::intern("answer");
        context.labels_insert(name);
        context.define_data(name, i32_ty, Value::Scalar(Scalar::I32(42)));
        let assembly = emit_module(&context, "data.rill");
        assert!(assembly.contains("\t.data\n"));
        assert!(assembly.contains("\t.globl\tanswer\n"));
        assert!(assembly.contains("\t.balign\t4\n"));
        assert!(assembly.contains("\t.type\tanswer, @object\n"));
        assert!(assembly.contains("\t.size\tanswer, 4\n"));
        assert!(assembly.contains("answer:\n\t.long\t42\n"));
    }

    #[test]
    fn uninitialized_data_goes_to_bss() {
        let mut context = Context::new();
        let i32_ty = context.types.scalar(ScalarKind::I32);
        let name = Symbol::intern("blank");
        context.labels_insert(name);
        context.define_data(name, i32_ty, Value::Scalar(Scalar::Uninitialized));
        let assembly = emit_module(&context, "data.rill");
        assert!(assembly.contains("\t.bss\n"));
        assert!(assembly.contains("blank:\n\t.zero\t4\n"));
    }

    #[test]
    fn tuple_data_interleaves_padding() {
        let mut context = Context::new();
        let i8_ty = context.types.scalar(ScalarKind::I8);
        let i32_ty = context.types.scalar(ScalarKind::I32);
        let pair_ty = context.types.intern_tuple(vec![i8_ty, i32_ty]);
        let name = Symbol::intern("padded_pair");
        context.labels_insert(name);
        context.define_data(
            name,
            pair_ty,
            Value::Tuple(Tuple::new(vec![
                Operand::Immediate(Scalar::I8(1)),
                Operand::Immediate(Scalar::I32(2)),
            ])),
        );
        let assembly = emit_module(&context, "data.rill");
        assert!(assembly.contains("padded_pair:\n\t.byte\t1\n\t.zero\t3\n\t.long\t2\n"));
    }

    #[test]
    fn emission_is_deterministic() {
        let build = || {
            module_with_main(|_, function| {
                function.append(Instruction::Ret {
                    value: Operand::Immediate(Scalar::I32(3)),
                });
            })
        };
        let first = emit_module(&build(), "same.rill");
        let second = emit_module(&build(), "same.rill");
        assert_eq!(first, second);
    }
}
