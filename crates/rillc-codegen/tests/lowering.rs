//! Selector and allocator behaviour over whole functions.

use rillc_codegen::select_function;
use rillc_codegen::x64::{Address, AddressBase, Gpr, OperandSize, X64Instruction, X64Operand};
use rillc_ir::{
    Context, Function, Instruction, Operand, Scalar, ScalarKind, SsaId, Tuple, TypeId, Value,
};
use rillc_util::Symbol;

fn new_context() -> (Context, TypeId) {
    let context = Context::new();
    let i32_ty = context.types.scalar(ScalarKind::I32);
    (context, i32_ty)
}

fn ret_imm(function: &mut Function, value: i32) {
    function.append(Instruction::Ret { value: Operand::Immediate(Scalar::I32(value)) });
}

#[test]
fn empty_body_is_a_valid_stub() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("stub"), i32_ty);
    ret_imm(&mut function, 0);

    let selected = select_function(&context, &function);
    assert_eq!(selected.frame_size, 0);
    assert_eq!(
        selected.code,
        vec![
            X64Instruction::Push { src: X64Operand::Gpr(Gpr::Rbp) },
            X64Instruction::Mov {
                size: OperandSize::Quad,
                dst: X64Operand::Gpr(Gpr::Rbp),
                src: X64Operand::Gpr(Gpr::Rsp),
            },
            X64Instruction::Mov {
                size: OperandSize::Long,
                dst: X64Operand::Gpr(Gpr::Rax),
                src: X64Operand::Immediate(0),
            },
            X64Instruction::Mov {
                size: OperandSize::Quad,
                dst: X64Operand::Gpr(Gpr::Rsp),
                src: X64Operand::Gpr(Gpr::Rbp),
            },
            X64Instruction::Pop { dst: X64Operand::Gpr(Gpr::Rbp) },
            X64Instruction::Ret,
        ]
    );
}

#[test]
fn eight_arguments_reach_past_the_register_window() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("sum8"), i32_ty);
    let args: Vec<SsaId> = (0..8)
        .map(|i| function.push_argument(Symbol::intern(&format!("a{i}")), i32_ty))
        .collect();
    let mut accumulator = args[0];
    for &arg in &args[1..] {
        let next = function.new_local(i32_ty, None);
        function.append(Instruction::Add {
            dst: next,
            lhs: Operand::Ssa(accumulator),
            rhs: Operand::Ssa(arg),
        });
        accumulator = next;
    }
    function.append(Instruction::Ret { value: Operand::Ssa(accumulator) });

    let selected = select_function(&context, &function);

    // Arguments seven and eight live above the return address.
    let wants = [
        Address::base_offset(Gpr::Rbp, 16),
        Address::base_offset(Gpr::Rbp, 24),
    ];
    for want in wants {
        assert!(
            selected.code.iter().any(|i| matches!(
                i,
                X64Instruction::Add { src: X64Operand::Address(a), .. } if *a == want
            )),
            "no add reads {want:?}"
        );
    }
}

#[test]
fn register_exhaustion_spills_and_keeps_frame_aligned() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("pressure"), i32_ty);

    // Fifteen simultaneously-live locals: one more than the allocatable
    // register file.
    let locals: Vec<SsaId> = (0..15).map(|_| function.new_local(i32_ty, None)).collect();
    for (i, &local) in locals.iter().enumerate() {
        function.append(Instruction::Load {
            dst: local,
            src: Operand::Immediate(Scalar::I32(i as i32 + 1)),
        });
    }
    let mut accumulator = locals[0];
    for &local in &locals[1..] {
        let next = function.new_local(i32_ty, None);
        function.append(Instruction::Add {
            dst: next,
            lhs: Operand::Ssa(accumulator),
            rhs: Operand::Ssa(local),
        });
        accumulator = next;
    }
    function.append(Instruction::Ret { value: Operand::Ssa(accumulator) });

    let selected = select_function(&context, &function);

    assert!(selected.frame_size > 0, "register pressure must spill");
    assert_eq!(selected.frame_size % 16, 0);
    let spill_stores = selected
        .code
        .iter()
        .filter(|i| {
            matches!(
                i,
                X64Instruction::Mov {
                    dst: X64Operand::Address(Address { base: AddressBase::Gpr(Gpr::Rbp), offset, .. }),
                    src: X64Operand::Gpr(_),
                    ..
                } if *offset < 0
            )
        })
        .count();
    assert!(spill_stores >= 1);
}

/// The divisor must never sit in `%rax` or `%rdx` when `idiv` runs; both
/// are clobbered. Exercised for all four divisor shapes.
fn idiv_operand(selected: &[X64Instruction]) -> X64Operand {
    selected
        .iter()
        .find_map(|i| match i {
            X64Instruction::Idiv { src, .. } => Some(*src),
            _ => None,
        })
        .expect("no idiv emitted")
}

fn assert_divisor_is_safe(src: X64Operand) {
    assert_ne!(src, X64Operand::Gpr(Gpr::Rax));
    assert_ne!(src, X64Operand::Gpr(Gpr::Rdx));
    assert!(!matches!(src, X64Operand::Immediate(_)), "idiv takes no immediate");
}

fn call_result_then_div(context: &mut Context, divisor_first: bool) -> Function {
    // The callee's result lands in %rax, so the divisor starts there.
    let i32_ty = context.types.scalar(ScalarKind::I32);
    let unit_ty = context.types.intern_tuple(vec![]);
    let callee_ty = context.types.intern_function(i32_ty, vec![]);
    let callee = Symbol::intern("seven");
    let mut callee_fn = Function::new(callee, i32_ty);
    ret_imm(&mut callee_fn, 7);
    let callee_label = context.labels_insert(callee);
    context.define_function(callee, callee_ty, callee_fn);

    let mut function = Function::new(Symbol::intern("uses_rax"), i32_ty);
    let c = function.new_local(i32_ty, None);
    let q = function.new_local(i32_ty, None);
    let empty_args = context.constants_append(Value::Tuple(Tuple::new(vec![])), unit_ty);
    function.append(Instruction::Call {
        dst: c,
        callee: Operand::Label(callee_label),
        args: Operand::Constant(empty_args),
    });
    let (lhs, rhs) = if divisor_first {
        (Operand::Immediate(Scalar::I32(100)), Operand::Ssa(c))
    } else {
        (Operand::Ssa(c), Operand::Immediate(Scalar::I32(5)))
    };
    function.append(Instruction::Div { dst: q, lhs, rhs });
    function.append(Instruction::Ret { value: Operand::Ssa(q) });
    function
}

#[test]
fn division_by_a_value_in_rax_relocates_it() {
    let mut context = Context::new();
    let function = call_result_then_div(&mut context, true);
    let selected = select_function(&context, &function);
    assert_divisor_is_safe(idiv_operand(&selected.code));
    assert!(selected.code.contains(&X64Instruction::Cdq { size: OperandSize::Long }));
}

#[test]
fn division_with_dividend_already_in_rax() {
    let mut context = Context::new();
    let function = call_result_then_div(&mut context, false);
    let selected = select_function(&context, &function);
    assert_divisor_is_safe(idiv_operand(&selected.code));
}

#[test]
fn division_by_a_value_in_rdx_relocates_it() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("rdx_divisor"), i32_ty);

    // Eight live locals walk the allocation order up to %rdx.
    let locals: Vec<SsaId> = (0..8).map(|_| function.new_local(i32_ty, None)).collect();
    for (i, &local) in locals.iter().enumerate() {
        function.append(Instruction::Load {
            dst: local,
            src: Operand::Immediate(Scalar::I32(i as i32 + 1)),
        });
    }
    let q = function.new_local(i32_ty, None);
    // locals[7] sits in %rdx at this point.
    function.append(Instruction::Div {
        dst: q,
        lhs: Operand::Ssa(locals[0]),
        rhs: Operand::Ssa(locals[7]),
    });
    // Keep every local alive across the division.
    let mut accumulator = q;
    for &local in &locals {
        let next = function.new_local(i32_ty, None);
        function.append(Instruction::Add {
            dst: next,
            lhs: Operand::Ssa(accumulator),
            rhs: Operand::Ssa(local),
        });
        accumulator = next;
    }
    function.append(Instruction::Ret { value: Operand::Ssa(accumulator) });

    let selected = select_function(&context, &function);
    assert_divisor_is_safe(idiv_operand(&selected.code));
}

#[test]
fn division_by_immediate_materialises_a_scratch() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("imm_divisor"), i32_ty);
    let x = function.new_local(i32_ty, None);
    let q = function.new_local(i32_ty, None);
    function.append(Instruction::Load { dst: x, src: Operand::Immediate(Scalar::I32(9)) });
    function.append(Instruction::Div {
        dst: q,
        lhs: Operand::Ssa(x),
        rhs: Operand::Immediate(Scalar::I32(3)),
    });
    function.append(Instruction::Ret { value: Operand::Ssa(q) });

    let selected = select_function(&context, &function);
    assert_divisor_is_safe(idiv_operand(&selected.code));
}

#[test]
fn division_by_a_global_reads_through_a_scratch() {
    let (mut context, i32_ty) = new_context();
    let global = Symbol::intern("three_global");
    let label = context.labels_insert(global);
    context.define_data(global, i32_ty, Value::Scalar(Scalar::I32(3)));

    let mut function = Function::new(Symbol::intern("label_divisor"), i32_ty);
    let x = function.new_local(i32_ty, None);
    let q = function.new_local(i32_ty, None);
    function.append(Instruction::Load { dst: x, src: Operand::Immediate(Scalar::I32(9)) });
    function.append(Instruction::Div {
        dst: q,
        lhs: Operand::Ssa(x),
        rhs: Operand::Label(label),
    });
    function.append(Instruction::Ret { value: Operand::Ssa(q) });

    let selected = select_function(&context, &function);
    assert_divisor_is_safe(idiv_operand(&selected.code));
}

#[test]
fn remainder_comes_back_through_rdx() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("rem_rdx"), i32_ty);
    let x = function.new_local(i32_ty, None);
    let r = function.new_local(i32_ty, None);
    function.append(Instruction::Load { dst: x, src: Operand::Immediate(Scalar::I32(9)) });
    function.append(Instruction::Mod {
        dst: r,
        lhs: Operand::Ssa(x),
        rhs: Operand::Immediate(Scalar::I32(3)),
    });
    function.append(Instruction::Ret { value: Operand::Ssa(r) });

    let selected = select_function(&context, &function);
    // The return copies the remainder out of %rdx.
    assert!(selected.code.contains(&X64Instruction::Mov {
        size: OperandSize::Long,
        dst: X64Operand::Gpr(Gpr::Rax),
        src: X64Operand::Gpr(Gpr::Rdx),
    }));
}

#[test]
fn callee_saved_registers_are_saved_and_restored() {
    let (context, i32_ty) = new_context();
    let mut function = Function::new(Symbol::intern("deep_pressure"), i32_ty);
    // Enough simultaneously-live locals to reach %rbx and friends.
    let locals: Vec<SsaId> = (0..14).map(|_| function.new_local(i32_ty, None)).collect();
    for (i, &local) in locals.iter().enumerate() {
        function.append(Instruction::Load {
            dst: local,
            src: Operand::Immediate(Scalar::I32(i as i32)),
        });
    }
    let mut accumulator = locals[0];
    for &local in &locals[1..] {
        let next = function.new_local(i32_ty, None);
        function.append(Instruction::Add {
            dst: next,
            lhs: Operand::Ssa(accumulator),
            rhs: Operand::Ssa(local),
        });
        accumulator = next;
    }
    function.append(Instruction::Ret { value: Operand::Ssa(accumulator) });

    let selected = select_function(&context, &function);
    let saves: Vec<&X64Instruction> = selected
        .code
        .iter()
        .filter(|i| {
            matches!(
                i,
                X64Instruction::Mov {
                    size: OperandSize::Quad,
                    dst: X64Operand::Address(_),
                    src: X64Operand::Gpr(g),
                } if g.is_callee_saved()
            )
        })
        .collect();
    let restores: Vec<&X64Instruction> = selected
        .code
        .iter()
        .filter(|i| {
            matches!(
                i,
                X64Instruction::Mov {
                    size: OperandSize::Quad,
                    dst: X64Operand::Gpr(g),
                    src: X64Operand::Address(_),
                } if g.is_callee_saved()
            )
        })
        .collect();
    assert!(!saves.is_empty(), "rbx allocation must be saved");
    assert_eq!(saves.len(), restores.len());
}

#[test]
fn calls_load_arguments_into_abi_registers() {
    let mut context = Context::new();
    let i32_ty = context.types.scalar(ScalarKind::I32);
    let pair_ty = context.types.intern_tuple(vec![i32_ty, i32_ty]);
    let callee_ty = context.types.intern_function(i32_ty, vec![i32_ty, i32_ty]);

    let callee = Symbol::intern("add2");
    let mut callee_fn = Function::new(callee, i32_ty);
    let a = callee_fn.push_argument(Symbol::intern("a"), i32_ty);
    let b = callee_fn.push_argument(Symbol::intern("b"), i32_ty);
    let s = callee_fn.new_local(i32_ty, None);
    callee_fn.append(Instruction::Add { dst: s, lhs: Operand::Ssa(a), rhs: Operand::Ssa(b) });
    callee_fn.append(Instruction::Ret { value: Operand::Ssa(s) });
    let callee_label = context.labels_insert(callee);
    context.define_function(callee, callee_ty, callee_fn);

    let mut function = Function::new(Symbol::intern("caller"), i32_ty);
    let result = function.new_local(i32_ty, None);
    let args = context.constants_append(
        Value::Tuple(Tuple::new(vec![
            Operand::Immediate(Scalar::I32(2)),
            Operand::Immediate(Scalar::I32(3)),
        ])),
        pair_ty,
    );
    function.append(Instruction::Call {
        dst: result,
        callee: Operand::Label(callee_label),
        args: Operand::Constant(args),
    });
    function.append(Instruction::Ret { value: Operand::Ssa(result) });

    let selected = select_function(&context, &function);
    assert!(selected.code.contains(&X64Instruction::Mov {
        size: OperandSize::Long,
        dst: X64Operand::Gpr(Gpr::Rdi),
        src: X64Operand::Immediate(2),
    }));
    assert!(selected.code.contains(&X64Instruction::Mov {
        size: OperandSize::Long,
        dst: X64Operand::Gpr(Gpr::Rsi),
        src: X64Operand::Immediate(3),
    }));
    assert!(selected
        .code
        .iter()
        .any(|i| matches!(i, X64Instruction::Call { target: X64Operand::Label(_) })));
}

#[test]
fn tuple_locals_live_in_memory_and_dot_reads_fields() {
    let mut context = Context::new();
    let i32_ty = context.types.scalar(ScalarKind::I32);
    let pair_ty = context.types.intern_tuple(vec![i32_ty, i32_ty]);

    let mut function = Function::new(Symbol::intern("pick"), i32_ty);
    let pair = function.new_local(pair_ty, None);
    let second = function.new_local(i32_ty, None);
    let pair_value = context.constants_append(
        Value::Tuple(Tuple::new(vec![
            Operand::Immediate(Scalar::I32(10)),
            Operand::Immediate(Scalar::I32(20)),
        ])),
        pair_ty,
    );
    function.append(Instruction::Load { dst: pair, src: Operand::Constant(pair_value) });
    function.append(Instruction::Dot {
        dst: second,
        tuple: Operand::Ssa(pair),
        index: Operand::Immediate(Scalar::I32(1)),
    });
    function.append(Instruction::Ret { value: Operand::Ssa(second) });

    let selected = select_function(&context, &function);
    assert!(selected.frame_size >= 16, "the tuple needs a stack slot");
    // Field one of the pair sits four bytes into the slot at rbp-8.
    assert!(selected.code.contains(&X64Instruction::Mov {
        size: OperandSize::Long,
        dst: X64Operand::Address(Address::base_offset(Gpr::Rbp, -4)),
        src: X64Operand::Immediate(20),
    }));
}

#[test]
fn selection_is_deterministic() {
    let build = || {
        let (context, i32_ty) = new_context();
        let mut function = Function::new(Symbol::intern("det"), i32_ty);
        let x = function.new_local(i32_ty, None);
        let y = function.new_local(i32_ty, None);
        function.append(Instruction::Load { dst: x, src: Operand::Immediate(Scalar::I32(3)) });
        function.append(Instruction::Mul {
            dst: y,
            lhs: Operand::Ssa(x),
            rhs: Operand::Immediate(Scalar::I32(3)),
        });
        function.append(Instruction::Ret { value: Operand::Ssa(y) });
        (context, function)
    };
    let (context_a, function_a) = build();
    let (context_b, function_b) = build();
    let a = select_function(&context_a, &function_a);
    let b = select_function(&context_b, &function_b);
    assert_eq!(a.code, b.code);
    assert_eq!(a.frame_size, b.frame_size);
}
