//! Type checking and AST-to-IR lowering.
//!
//! Two passes over the module: the first declares every top-level symbol
//! (so call sites may precede their callee) and evaluates global constant
//! initialisers; the second lowers function bodies to IR. Everything the
//! core assumes about its input - valid SSA references, single assignment,
//! type-correct operands, a trailing `ret` - is established here.

use rustc_hash::FxHashMap;
use tracing::debug;

use rillc_ir::{
    Context, Function, Instruction, Operand, Scalar, ScalarKind, Tuple, Type, TypeId, Value,
};
use rillc_util::Symbol;

use crate::ast::{BinaryOp, Expr, ExprKind, FunctionItem, Item, Module, Stmt, TypeExpr, UnaryOp};
use crate::error::{FrontError, SourceLocation};

/// Check `module` and lower it into `context`.
pub fn check_module(module: &Module, context: &mut Context) -> Result<(), FrontError> {
    let mut globals: FxHashMap<Symbol, TypeId> = FxHashMap::default();

    // Pass 1: declare symbols and evaluate global constants.
    for item in &module.items {
        match item {
            Item::Function(function) => {
                reject_duplicate(&globals, function.name, function.location)?;
                let arg_types = function
                    .params
                    .iter()
                    .map(|param| resolve_type(context, &param.ty))
                    .collect::<Vec<_>>();
                for (param, &ty) in function.params.iter().zip(&arg_types) {
                    if !context.types.is_scalar(ty) {
                        return Err(FrontError::TypeMismatch {
                            expected: "a scalar parameter type".to_owned(),
                            found: type_name(context, ty),
                            location: param.location,
                        });
                    }
                }
                let return_type = resolve_type(context, &function.return_type);
                let fn_type = context.types.intern_function(return_type, arg_types);
                globals.insert(function.name, fn_type);
                context.labels_insert(function.name);
            }
            Item::Const(constant) => {
                reject_duplicate(&globals, constant.name, constant.location)?;
                let (value, ty) = const_value(context, &constant.value)?;
                if let Some(annotation) = &constant.ty {
                    let annotated = resolve_type(context, annotation);
                    if annotated != ty {
                        return Err(FrontError::TypeMismatch {
                            expected: type_name(context, annotated),
                            found: type_name(context, ty),
                            location: constant.location,
                        });
                    }
                }
                globals.insert(constant.name, ty);
                context.labels_insert(constant.name);
                context.define_data(constant.name, ty, value);
            }
        }
    }

    // Pass 2: lower function bodies.
    for item in &module.items {
        if let Item::Function(function) = item {
            let fn_type = globals[&function.name];
            let lowered = lower_function(context, &globals, function, fn_type)?;
            debug!(function = %function.name, locals = lowered.ssa_count(), "lowered");
            context.define_function(function.name, fn_type, lowered);
        }
    }
    Ok(())
}

fn reject_duplicate(
    globals: &FxHashMap<Symbol, TypeId>,
    name: Symbol,
    location: SourceLocation,
) -> Result<(), FrontError> {
    if globals.contains_key(&name) {
        return Err(FrontError::DuplicateDefinition { name, location });
    }
    Ok(())
}

fn resolve_type(context: &mut Context, ty: &TypeExpr) -> TypeId {
    match ty {
        TypeExpr::Nil => context.types.scalar(ScalarKind::Nil),
        TypeExpr::Bool => context.types.scalar(ScalarKind::Bool),
        TypeExpr::I32 => context.types.scalar(ScalarKind::I32),
        TypeExpr::Tuple(fields) => {
            let fields = fields.iter().map(|field| resolve_type(context, field)).collect();
            context.types.intern_tuple(fields)
        }
    }
}

/// Render a type for diagnostics.
fn type_name(context: &Context, ty: TypeId) -> String {
    match context.types.get(ty) {
        Type::Scalar(kind) => kind.to_string(),
        Type::Tuple(fields) => {
            let fields: Vec<String> = fields.iter().map(|&f| type_name(context, f)).collect();
            format!("({})", fields.join(", "))
        }
        Type::Function { ret, args } => {
            let args: Vec<String> = args.iter().map(|&a| type_name(context, a)).collect();
            format!("fn({}) -> {}", args.join(", "), type_name(context, *ret))
        }
    }
}

fn check_i32(value: i64, location: SourceLocation) -> Result<i32, FrontError> {
    i32::try_from(value).map_err(|_| FrontError::IntegerOutOfRange { location })
}

/// Evaluate a global initialiser to a compile-time [`Value`].
fn const_value(context: &mut Context, expr: &Expr) -> Result<(Value, TypeId), FrontError> {
    match &expr.kind {
        ExprKind::Integer(value) => {
            let value = check_i32(*value, expr.location)?;
            Ok((Value::Scalar(Scalar::I32(value)), context.types.scalar(ScalarKind::I32)))
        }
        ExprKind::Bool(value) => {
            Ok((Value::Scalar(Scalar::Bool(*value)), context.types.scalar(ScalarKind::Bool)))
        }
        ExprKind::Nil => Ok((Value::Scalar(Scalar::Nil), context.types.scalar(ScalarKind::Nil))),
        ExprKind::Unary(UnaryOp::Neg, inner) => {
            if let ExprKind::Integer(value) = inner.kind {
                let value = check_i32(-value, expr.location)?;
                Ok((Value::Scalar(Scalar::I32(value)), context.types.scalar(ScalarKind::I32)))
            } else {
                Err(FrontError::NotConstant { location: expr.location })
            }
        }
        ExprKind::Tuple(elements) => {
            let mut operands = Vec::with_capacity(elements.len());
            let mut types = Vec::with_capacity(elements.len());
            for element in elements {
                let (value, ty) = const_value(context, element)?;
                let operand = match value {
                    Value::Scalar(scalar) => Operand::Immediate(scalar),
                    Value::Tuple(_) => Operand::Constant(context.constants_append(value, ty)),
                };
                operands.push(operand);
                types.push(ty);
            }
            let tuple_type = context.types.intern_tuple(types);
            Ok((Value::Tuple(Tuple::new(operands)), tuple_type))
        }
        _ => Err(FrontError::NotConstant { location: expr.location }),
    }
}

fn lower_function(
    context: &mut Context,
    globals: &FxHashMap<Symbol, TypeId>,
    item: &FunctionItem,
    fn_type: TypeId,
) -> Result<Function, FrontError> {
    let Type::Function { ret, args } = context.types.get(fn_type).clone() else {
        unreachable!("function symbol with non-function type")
    };

    let mut function = Function::new(item.name, ret);
    for (param, ty) in item.params.iter().zip(args) {
        function.push_argument(param.name, ty);
    }

    let mut lowerer = FunctionChecker { context, globals, function };
    let mut returned = false;
    for statement in &item.body {
        if returned {
            let location = match statement {
                Stmt::Return { location, .. } | Stmt::Const { location, .. } => *location,
            };
            return Err(FrontError::UnreachableCode { location });
        }
        match statement {
            Stmt::Return { value, location } => {
                let (operand, ty) = lowerer.lower_expr(value)?;
                if ty != ret {
                    return Err(FrontError::TypeMismatch {
                        expected: type_name(lowerer.context, ret),
                        found: type_name(lowerer.context, ty),
                        location: *location,
                    });
                }
                lowerer.function.append(Instruction::Ret { value: operand });
                returned = true;
            }
            Stmt::Const { name, value, .. } => {
                let (operand, ty) = lowerer.lower_expr(value)?;
                let dst = lowerer.function.new_local(ty, Some(*name));
                lowerer.function.append(Instruction::Load { dst, src: operand });
            }
        }
    }

    if !returned {
        let nil = lowerer.context.types.scalar(ScalarKind::Nil);
        if ret == nil {
            lowerer.function.append(Instruction::Ret {
                value: Operand::Immediate(Scalar::Nil),
            });
        } else {
            return Err(FrontError::MissingReturn { location: item.location });
        }
    }
    Ok(lowerer.function)
}

struct FunctionChecker<'a> {
    context: &'a mut Context,
    globals: &'a FxHashMap<Symbol, TypeId>,
    function: Function,
}

impl FunctionChecker<'_> {
    fn i32_type(&self) -> TypeId {
        self.context.types.scalar(ScalarKind::I32)
    }

    fn require_i32(&self, ty: TypeId, location: SourceLocation) -> Result<(), FrontError> {
        if ty != self.i32_type() {
            return Err(FrontError::TypeMismatch {
                expected: "i32".to_owned(),
                found: type_name(self.context, ty),
                location,
            });
        }
        Ok(())
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<(Operand, TypeId), FrontError> {
        match &expr.kind {
            ExprKind::Integer(value) => {
                let value = check_i32(*value, expr.location)?;
                Ok((Operand::Immediate(Scalar::I32(value)), self.i32_type()))
            }
            ExprKind::Bool(value) => Ok((
                Operand::Immediate(Scalar::Bool(*value)),
                self.context.types.scalar(ScalarKind::Bool),
            )),
            ExprKind::Nil => Ok((
                Operand::Immediate(Scalar::Nil),
                self.context.types.scalar(ScalarKind::Nil),
            )),
            ExprKind::Name(name) => self.lower_name(*name, expr.location),
            ExprKind::Unary(UnaryOp::Neg, inner) => {
                // Fold a negated literal so i32::MIN is expressible.
                if let ExprKind::Integer(value) = inner.kind {
                    let value = check_i32(-value, expr.location)?;
                    return Ok((Operand::Immediate(Scalar::I32(value)), self.i32_type()));
                }
                let (operand, ty) = self.lower_expr(inner)?;
                self.require_i32(ty, inner.location)?;
                let dst = self.function.new_local(ty, None);
                self.function.append(Instruction::Neg { dst, src: operand });
                Ok((Operand::Ssa(dst), ty))
            }
            ExprKind::Binary(op, lhs, rhs) => {
                let (lhs_op, lhs_ty) = self.lower_expr(lhs)?;
                self.require_i32(lhs_ty, lhs.location)?;
                let (rhs_op, rhs_ty) = self.lower_expr(rhs)?;
                self.require_i32(rhs_ty, rhs.location)?;
                let dst = self.function.new_local(lhs_ty, None);
                let instruction = match op {
                    BinaryOp::Add => Instruction::Add { dst, lhs: lhs_op, rhs: rhs_op },
                    BinaryOp::Sub => Instruction::Sub { dst, lhs: lhs_op, rhs: rhs_op },
                    BinaryOp::Mul => Instruction::Mul { dst, lhs: lhs_op, rhs: rhs_op },
                    BinaryOp::Div => Instruction::Div { dst, lhs: lhs_op, rhs: rhs_op },
                    BinaryOp::Mod => Instruction::Mod { dst, lhs: lhs_op, rhs: rhs_op },
                };
                self.function.append(instruction);
                Ok((Operand::Ssa(dst), lhs_ty))
            }
            ExprKind::Tuple(elements) => {
                let mut operands = Vec::with_capacity(elements.len());
                let mut types = Vec::with_capacity(elements.len());
                for element in elements {
                    let (operand, ty) = self.lower_expr(element)?;
                    operands.push(operand);
                    types.push(ty);
                }
                let tuple_type = self.context.types.intern_tuple(types);
                let id = self
                    .context
                    .constants_append(Value::Tuple(Tuple::new(operands)), tuple_type);
                Ok((Operand::Constant(id), tuple_type))
            }
            ExprKind::Field { base, index } => {
                let (base_op, base_ty) = self.lower_expr(base)?;
                let Type::Tuple(fields) = self.context.types.get(base_ty).clone() else {
                    return Err(FrontError::NotIndexable {
                        found: type_name(self.context, base_ty),
                        location: expr.location,
                    });
                };
                if *index as usize >= fields.len() {
                    return Err(FrontError::TupleIndexOutOfBounds {
                        index: *index,
                        len: fields.len(),
                        location: expr.location,
                    });
                }
                let field_ty = fields[*index as usize];
                let dst = self.function.new_local(field_ty, None);
                self.function.append(Instruction::Dot {
                    dst,
                    tuple: base_op,
                    index: Operand::Immediate(Scalar::I32(*index as i32)),
                });
                Ok((Operand::Ssa(dst), field_ty))
            }
            ExprKind::Call { callee, args } => self.lower_call(callee, args, expr.location),
        }
    }

    fn lower_name(
        &mut self,
        name: Symbol,
        location: SourceLocation,
    ) -> Result<(Operand, TypeId), FrontError> {
        if let Some(local) = self.function.local_named(name) {
            return Ok((Operand::Ssa(local.ssa), local.ty));
        }
        if let Some(&ty) = self.globals.get(&name) {
            let label = self.context.labels_insert(name);
            return Ok((Operand::Label(label), ty));
        }
        Err(FrontError::UndefinedSymbol { name, location })
    }

    fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        location: SourceLocation,
    ) -> Result<(Operand, TypeId), FrontError> {
        let ExprKind::Name(name) = callee.kind else {
            return Err(FrontError::NotCallable {
                found: "this expression".to_owned(),
                location: callee.location,
            });
        };
        if self.function.local_named(name).is_some() {
            return Err(FrontError::NotCallable {
                found: format!("`{name}`"),
                location: callee.location,
            });
        }
        let Some(&callee_ty) = self.globals.get(&name) else {
            return Err(FrontError::UndefinedSymbol { name, location: callee.location });
        };
        let Type::Function { ret, args: param_types } = self.context.types.get(callee_ty).clone()
        else {
            return Err(FrontError::NotCallable {
                found: format!("`{name}`"),
                location: callee.location,
            });
        };

        if args.len() != param_types.len() {
            return Err(FrontError::ArgumentCountMismatch {
                expected: param_types.len(),
                found: args.len(),
                location,
            });
        }
        let mut operands = Vec::with_capacity(args.len());
        for (argument, &expected) in args.iter().zip(&param_types) {
            let (operand, ty) = self.lower_expr(argument)?;
            if ty != expected {
                return Err(FrontError::TypeMismatch {
                    expected: type_name(self.context, expected),
                    found: type_name(self.context, ty),
                    location: argument.location,
                });
            }
            operands.push(operand);
        }

        let args_type = self.context.types.intern_tuple(param_types);
        let args_id = self
            .context
            .constants_append(Value::Tuple(Tuple::new(operands)), args_type);
        let label = self.context.labels_insert(name);
        let dst = self.function.new_local(ret, None);
        self.function.append(Instruction::Call {
            dst,
            callee: Operand::Label(label),
            args: Operand::Constant(args_id),
        });
        Ok((Operand::Ssa(dst), ret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, parser};
    use rillc_ir::SymbolKind;

    fn check_source(source: &str) -> Result<Context, FrontError> {
        let mut context = Context::new();
        let module = parser::parse(lexer::lex(source).unwrap())?;
        check_module(&module, &mut context)?;
        Ok(context)
    }

    fn body_of(context: &Context, name: &str) -> Vec<Instruction> {
        let entry = context.symbol(Symbol::intern(name)).unwrap();
        let SymbolKind::Code(function) = &entry.kind else { panic!("{name} is not code") };
        function.block.clone()
    }

    #[test]
    fn lowers_return_of_a_literal() {
        let context = check_source("fn main() -> i32 { return 0; }").unwrap();
        assert_eq!(
            body_of(&context, "main"),
            vec![Instruction::Ret { value: Operand::Immediate(Scalar::I32(0)) }]
        );
    }

    #[test]
    fn lowers_arithmetic_to_ssa_chains() {
        let context = check_source("fn main() -> i32 { return 3 + 3; }").unwrap();
        let block = body_of(&context, "main");
        assert_eq!(block.len(), 2);
        assert!(matches!(block[0], Instruction::Add { .. }));
        assert!(matches!(block[1], Instruction::Ret { value: Operand::Ssa(_) }));
    }

    #[test]
    fn named_constants_bind_locals() {
        let context = check_source(
            "fn main() -> i32 { const x = 3; const y = 3; return x * y; }",
        )
        .unwrap();
        let block = body_of(&context, "main");
        assert!(matches!(block[0], Instruction::Load { .. }));
        assert!(matches!(block[1], Instruction::Load { .. }));
        assert!(matches!(block[2], Instruction::Mul { .. }));
        assert!(matches!(block[3], Instruction::Ret { .. }));
    }

    #[test]
    fn calls_check_arity_and_types() {
        let source = "fn add(a: i32, b: i32) -> i32 { return a + b; }
                      fn main() -> i32 { return add(2, 3); }";
        let context = check_source(source).unwrap();
        let block = body_of(&context, "main");
        assert!(matches!(block[0], Instruction::Call { .. }));

        let error = check_source(
            "fn add(a: i32, b: i32) -> i32 { return a + b; }
             fn main() -> i32 { return add(2); }",
        )
        .unwrap_err();
        assert!(matches!(error, FrontError::ArgumentCountMismatch { expected: 2, found: 1, .. }));

        let error = check_source(
            "fn add(a: i32, b: i32) -> i32 { return a + b; }
             fn main() -> i32 { return add(2, true); }",
        )
        .unwrap_err();
        assert!(matches!(error, FrontError::TypeMismatch { .. }));
    }

    #[test]
    fn undefined_symbols_are_reported() {
        let error = check_source("fn main() -> i32 { return ghost; }").unwrap_err();
        assert!(matches!(error, FrontError::UndefinedSymbol { .. }));
    }

    #[test]
    fn non_functions_are_not_callable() {
        let error = check_source(
            "const three = 3; fn main() -> i32 { return three(); }",
        )
        .unwrap_err();
        assert!(matches!(error, FrontError::NotCallable { .. }));
    }

    #[test]
    fn tuple_indexing_is_bounds_checked() {
        let error =
            check_source("fn main() -> i32 { const t = (1, 2); return t.2; }").unwrap_err();
        assert!(matches!(
            error,
            FrontError::TupleIndexOutOfBounds { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn scalars_are_not_indexable() {
        let error = check_source("fn main() -> i32 { const x = 1; return x.0; }").unwrap_err();
        assert!(matches!(error, FrontError::NotIndexable { .. }));
    }

    #[test]
    fn return_type_must_match() {
        let error = check_source("fn main() -> i32 { return true; }").unwrap_err();
        assert!(matches!(error, FrontError::TypeMismatch { .. }));
    }

    #[test]
    fn literal_range_is_enforced() {
        let error = check_source("fn main() -> i32 { return 2147483648; }").unwrap_err();
        assert!(matches!(error, FrontError::IntegerOutOfRange { .. }));
        // i32::MIN is expressible through folding.
        check_source("fn main() -> i32 { return -2147483648; }").unwrap();
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let error = check_source(
            "fn main() -> i32 { return 0; } fn main() -> i32 { return 1; }",
        )
        .unwrap_err();
        assert!(matches!(error, FrontError::DuplicateDefinition { .. }));
    }

    #[test]
    fn code_after_return_is_unreachable() {
        let error = check_source(
            "fn main() -> i32 { return 0; const x = 1; }",
        )
        .unwrap_err();
        assert!(matches!(error, FrontError::UnreachableCode { .. }));
    }

    #[test]
    fn nil_functions_may_omit_return() {
        let context = check_source("fn noop() -> nil { } fn main() -> i32 { return 0; }").unwrap();
        let block = body_of(&context, "noop");
        assert_eq!(block, vec![Instruction::Ret { value: Operand::Immediate(Scalar::Nil) }]);
    }

    #[test]
    fn value_functions_require_a_return() {
        let error = check_source("fn main() -> i32 { const x = 1; }").unwrap_err();
        assert!(matches!(error, FrontError::MissingReturn { .. }));
    }

    #[test]
    fn global_constants_become_data_symbols() {
        let context = check_source(
            "const answer = 42; fn main() -> i32 { return answer; }",
        )
        .unwrap();
        let entry = context.symbol(Symbol::intern("answer")).unwrap();
        assert!(matches!(
            &entry.kind,
            SymbolKind::Data(Value::Scalar(Scalar::I32(42)))
        ));
        let block = body_of(&context, "main");
        assert!(matches!(block[0], Instruction::Ret { value: Operand::Label(_) }));
    }

    #[test]
    fn global_tuple_constants_are_supported() {
        let context = check_source(
            "const pair = (1, 2); fn main() -> i32 { return pair.0; }",
        )
        .unwrap();
        let entry = context.symbol(Symbol::intern("pair")).unwrap();
        assert!(matches!(&entry.kind, SymbolKind::Data(Value::Tuple(_))));
        let block = body_of(&context, "main");
        assert!(matches!(block[0], Instruction::Dot { tuple: Operand::Label(_), .. }));
    }

    #[test]
    fn global_initialisers_must_be_constant() {
        let error = check_source("const x = y; fn main() -> i32 { return 0; }").unwrap_err();
        assert!(matches!(error, FrontError::NotConstant { .. }));
    }

    #[test]
    fn shadowing_rebinds_to_the_latest_local() {
        let context = check_source(
            "fn main() -> i32 { const x = 1; const x = 2; return x; }",
        )
        .unwrap();
        let block = body_of(&context, "main");
        // The return reads the second binding's SSA slot.
        let Instruction::Ret { value: Operand::Ssa(ssa) } = block[2] else { panic!() };
        let Instruction::Load { dst, .. } = block[1] else { panic!() };
        assert_eq!(ssa, dst);
    }
}
