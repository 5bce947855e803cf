//! Per-function lifetime analysis.
//!
//! Walks a function's block in reverse. Because the IR is in SSA form, the
//! defining instruction is always the first use of a local and there are no
//! lifetime holes, so one `(first_use, last_use)` pair per local captures
//! everything the allocator needs.
//!
//! Tuple constants may embed `Ssa` operands (a call's actual-argument
//! pack), so sources of kind `Constant` are traversed recursively: an SSA
//! reference inside a tuple counts as a use at the referencing
//! instruction's index.

use rillc_util::IndexVec;

use rillc_ir::{Context, Function, Lifetime, Operand, SsaId, Value};

/// Lifetime table of one function, indexed by SSA id.
pub type Lifetimes = IndexVec<SsaId, Lifetime>;

/// Compute the lifetime of every SSA local in `function`.
///
/// Postcondition, for every local `k`: `first_use(k)` is the index of the
/// defining instruction (0 for formal arguments, which are defined at
/// entry) and `last_use(k)` is the greatest index at which `k` occurs as a
/// source, or `first_use(k)` if it is never read.
pub fn compute(function: &Function, context: &Context) -> Lifetimes {
    let mut lifetimes = Lifetimes::from_elem(Lifetime::default(), function.ssa_count());

    for index in (0..function.block.len()).rev() {
        let at = index as u32;
        let instruction = &function.block[index];
        if let Some(dst) = instruction.dst() {
            // The defining site is the unique first use; walking forward or
            // backward gives the same answer.
            lifetimes[dst].first_use = at;
        }
        instruction.for_each_source(|operand| {
            mark_source(operand, at, &mut lifetimes, context);
        });
    }

    for lifetime in lifetimes.iter_mut() {
        lifetime.last_use = lifetime.last_use.max(lifetime.first_use);
    }

    lifetimes
}

fn mark_source(operand: Operand, at: u32, lifetimes: &mut Lifetimes, context: &Context) {
    match operand {
        Operand::Ssa(ssa) => {
            if lifetimes[ssa].last_use < at {
                lifetimes[ssa].last_use = at;
            }
        }
        Operand::Constant(id) => {
            if let Value::Tuple(tuple) = &context.constants_at(id).value {
                for &element in &tuple.elements {
                    mark_source(element, at, lifetimes, context);
                }
            }
        }
        Operand::Immediate(_) | Operand::Label(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rillc_ir::{Instruction, Scalar, ScalarKind, SsaId, Tuple};
    use rillc_util::Symbol;

    fn context() -> Context {
        Context::new()
    }

    #[test]
    fn first_use_is_definition_last_use_is_final_read() {
        let mut ctx = context();
        let i32_ty = ctx.types.scalar(ScalarKind::I32);
        let mut func = Function::new(Symbol::intern("lt_basic"), i32_ty);
        let a = func.new_local(i32_ty, None);
        let b = func.new_local(i32_ty, None);
        // 0: a = load 1
        // 1: b = add a, a
        // 2: ret b
        func.append(Instruction::Load { dst: a, src: Operand::Immediate(Scalar::I32(1)) });
        func.append(Instruction::Add { dst: b, lhs: Operand::Ssa(a), rhs: Operand::Ssa(a) });
        func.append(Instruction::Ret { value: Operand::Ssa(b) });

        let lifetimes = compute(&func, &ctx);
        assert_eq!(lifetimes[a], Lifetime { first_use: 0, last_use: 1 });
        assert_eq!(lifetimes[b], Lifetime { first_use: 1, last_use: 2 });

        // Results attach back onto the local records.
        func.attach_lifetimes(&lifetimes);
        assert_eq!(func.local(a).lifetime, lifetimes[a]);
        assert_eq!(func.local(b).lifetime, lifetimes[b]);
    }

    #[test]
    fn unused_local_dies_at_its_definition() {
        let mut ctx = context();
        let i32_ty = ctx.types.scalar(ScalarKind::I32);
        let mut func = Function::new(Symbol::intern("lt_unused"), i32_ty);
        let dead = func.new_local(i32_ty, None);
        func.append(Instruction::Load { dst: dead, src: Operand::Immediate(Scalar::I32(9)) });
        func.append(Instruction::Ret { value: Operand::Immediate(Scalar::I32(0)) });

        let lifetimes = compute(&func, &ctx);
        assert_eq!(lifetimes[dead], Lifetime { first_use: 0, last_use: 0 });
    }

    #[test]
    fn arguments_are_defined_at_entry() {
        let mut ctx = context();
        let i32_ty = ctx.types.scalar(ScalarKind::I32);
        let mut func = Function::new(Symbol::intern("lt_args"), i32_ty);
        let a = func.push_argument(Symbol::intern("a"), i32_ty);
        let sum = func.new_local(i32_ty, None);
        func.append(Instruction::Add {
            dst: sum,
            lhs: Operand::Ssa(a),
            rhs: Operand::Immediate(Scalar::I32(1)),
        });
        func.append(Instruction::Ret { value: Operand::Ssa(sum) });

        let lifetimes = compute(&func, &ctx);
        assert_eq!(lifetimes[a], Lifetime { first_use: 0, last_use: 0 });
        assert_eq!(lifetimes[SsaId(1)], Lifetime { first_use: 0, last_use: 1 });
    }

    #[test]
    fn ssa_references_inside_tuple_constants_count_as_uses() {
        let mut ctx = context();
        let i32_ty = ctx.types.scalar(ScalarKind::I32);
        let pair_ty = {
            let a = i32_ty;
            ctx.types.intern_tuple(vec![a, a])
        };
        let mut func = Function::new(Symbol::intern("lt_tuple"), i32_ty);
        let x = func.new_local(i32_ty, None);
        let result = func.new_local(i32_ty, None);

        func.append(Instruction::Load { dst: x, src: Operand::Immediate(Scalar::I32(2)) });
        let args = ctx.constants_append(
            rillc_ir::Value::Tuple(Tuple::new(vec![
                Operand::Ssa(x),
                Operand::Immediate(Scalar::I32(3)),
            ])),
            pair_ty,
        );
        let callee = ctx.labels_insert(Symbol::intern("callee_fn"));
        func.append(Instruction::Call {
            dst: result,
            callee: Operand::Label(callee),
            args: Operand::Constant(args),
        });
        func.append(Instruction::Ret { value: Operand::Ssa(result) });

        let lifetimes = compute(&func, &ctx);
        // x is used at index 1 through the argument tuple.
        assert_eq!(lifetimes[x], Lifetime { first_use: 0, last_use: 1 });
    }
}
