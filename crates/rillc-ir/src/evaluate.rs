//! Reference evaluation of IR functions.
//!
//! Walks one function's block in order, keeping a frame of per-local
//! slots; `call` evaluates the callee in a fresh frame. Arithmetic is
//! 32-bit wrapping with truncating division, matching what the selected
//! x86-64 instructions compute, so the evaluator serves as the ground
//! truth the backend is checked against.

use rillc_util::IndexVec;

use crate::context::{Context, SymbolKind};
use crate::function::Function;
use crate::instruction::Instruction;
use crate::operand::Operand;
use crate::value::Value;
use crate::SsaId;

/// Evaluate `function` with the given scalar arguments, returning its
/// scalar result widened to `i64`.
///
/// # Panics
///
/// Panics on ill-formed IR (unset locals, non-scalar arithmetic, calls to
/// non-functions), on division by zero, and on composite results; all of
/// these are front-end bugs or inputs the compiled program would fault on
/// anyway.
pub fn evaluate(function: &Function, context: &Context, arguments: &[i64]) -> i64 {
    match evaluate_frame(function, context, arguments) {
        Slot::Scalar(value) => value,
        slot => panic!("function {} evaluated to a composite {slot:?}", function.name),
    }
}

/// The run-time value of one local.
#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Unset,
    Scalar(i64),
    Tuple(Vec<Slot>),
}

impl Slot {
    fn as_i32(&self) -> i32 {
        match self {
            Slot::Scalar(value) => *value as i32,
            slot => panic!("scalar operation on {slot:?}"),
        }
    }
}

fn evaluate_frame(function: &Function, context: &Context, arguments: &[i64]) -> Slot {
    assert_eq!(
        arguments.len(),
        function.args.len(),
        "{} takes {} arguments",
        function.name,
        function.args.len()
    );
    let mut frame: IndexVec<SsaId, Slot> =
        IndexVec::from_elem(Slot::Unset, function.ssa_count());
    for (argument, &value) in function.args.iter().zip(arguments) {
        frame[argument.ssa] = Slot::Scalar(value);
    }

    for instruction in &function.block {
        match *instruction {
            Instruction::Ret { value } => return operand_slot(value, &frame, context),
            Instruction::Call { dst, callee, args } => {
                frame[dst] = evaluate_call(callee, args, &frame, context);
            }
            Instruction::Dot { dst, tuple, index } => {
                let Slot::Tuple(elements) = operand_slot(tuple, &frame, context) else {
                    panic!("dot on a non-tuple operand")
                };
                let index = match index {
                    Operand::Immediate(scalar) => scalar.as_i64() as usize,
                    _ => panic!("tuple index is not a compile-time constant"),
                };
                frame[dst] = elements[index].clone();
            }
            Instruction::Load { dst, src } => {
                frame[dst] = operand_slot(src, &frame, context);
            }
            Instruction::Neg { dst, src } => {
                let value = operand_slot(src, &frame, context).as_i32();
                frame[dst] = Slot::Scalar(i64::from(value.wrapping_neg()));
            }
            Instruction::Add { dst, lhs, rhs } => {
                frame[dst] = binary(lhs, rhs, &frame, context, i32::wrapping_add);
            }
            Instruction::Sub { dst, lhs, rhs } => {
                frame[dst] = binary(lhs, rhs, &frame, context, i32::wrapping_sub);
            }
            Instruction::Mul { dst, lhs, rhs } => {
                frame[dst] = binary(lhs, rhs, &frame, context, i32::wrapping_mul);
            }
            Instruction::Div { dst, lhs, rhs } => {
                frame[dst] = binary(lhs, rhs, &frame, context, |a, b| {
                    assert!(b != 0, "division by zero during evaluation");
                    a.wrapping_div(b)
                });
            }
            Instruction::Mod { dst, lhs, rhs } => {
                frame[dst] = binary(lhs, rhs, &frame, context, |a, b| {
                    assert!(b != 0, "division by zero during evaluation");
                    a.wrapping_rem(b)
                });
            }
        }
    }
    panic!("function {} fell off the end of its block", function.name)
}

fn binary(
    lhs: Operand,
    rhs: Operand,
    frame: &IndexVec<SsaId, Slot>,
    context: &Context,
    op: impl Fn(i32, i32) -> i32,
) -> Slot {
    let lhs = operand_slot(lhs, frame, context).as_i32();
    let rhs = operand_slot(rhs, frame, context).as_i32();
    Slot::Scalar(i64::from(op(lhs, rhs)))
}

/// Resolve an operand to its run-time value in the current frame.
fn operand_slot(operand: Operand, frame: &IndexVec<SsaId, Slot>, context: &Context) -> Slot {
    match operand {
        Operand::Ssa(ssa) => {
            let slot = frame[ssa].clone();
            assert!(slot != Slot::Unset, "{ssa:?} read before definition");
            slot
        }
        Operand::Immediate(scalar) => Slot::Scalar(scalar.as_i64()),
        Operand::Constant(id) => value_slot(&context.constants_at(id).value, frame, context),
        Operand::Label(label) => {
            let name = context.labels_at(label);
            let entry = context
                .symbol(name)
                .unwrap_or_else(|| panic!("label {name} has no symbol"));
            match &entry.kind {
                SymbolKind::Data(value) => value_slot(value, frame, context),
                SymbolKind::Code(_) => panic!("function {name} used as a value"),
            }
        }
    }
}

/// A tuple value's elements are operands and may reference locals of the
/// referencing frame; resolve them against it.
fn value_slot(value: &Value, frame: &IndexVec<SsaId, Slot>, context: &Context) -> Slot {
    match value {
        Value::Scalar(scalar) => Slot::Scalar(scalar.as_i64()),
        Value::Tuple(tuple) => Slot::Tuple(
            tuple
                .elements
                .iter()
                .map(|&element| operand_slot(element, frame, context))
                .collect(),
        ),
    }
}

fn evaluate_call(
    callee: Operand,
    args: Operand,
    frame: &IndexVec<SsaId, Slot>,
    context: &Context,
) -> Slot {
    let Operand::Label(label) = callee else {
        panic!("call target is not a label")
    };
    let name = context.labels_at(label);
    let entry = context
        .symbol(name)
        .unwrap_or_else(|| panic!("call of undefined symbol {name}"));
    let SymbolKind::Code(callee_function) = &entry.kind else {
        panic!("call of non-function {name}")
    };

    // Each element of the actual-argument tuple is resolved in the
    // caller's frame before control passes to the callee.
    let Slot::Tuple(actual_arguments) = operand_slot(args, frame, context) else {
        panic!("call arguments are not a tuple")
    };
    let arguments: Vec<i64> = actual_arguments
        .iter()
        .map(|argument| i64::from(argument.as_i32()))
        .collect();
    evaluate_frame(callee_function, context, &arguments)
}
