//! IR instructions.
//!
//! Each defining opcode carries its destination as a typed [`SsaId`], so
//! "operand A is always the destination SSA" holds by construction; the
//! remaining operands are drawn from [`Operand`]. `Ret` defines nothing.

use std::fmt;

use crate::operand::Operand;
use crate::SsaId;

/// One three-address instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Instruction {
    /// Return `value` from the current function.
    Ret { value: Operand },
    /// Call `callee` (a `Label`) with `args` (a tuple `Constant` of actual
    /// arguments), defining `dst` as the result.
    Call { dst: SsaId, callee: Operand, args: Operand },
    /// Extract element `index` (a compile-time integer `Immediate`) of the
    /// tuple `tuple` into `dst`.
    Dot { dst: SsaId, tuple: Operand, index: Operand },
    /// Copy or initialise: define `dst` from `src`.
    Load { dst: SsaId, src: Operand },
    /// Arithmetic negation.
    Neg { dst: SsaId, src: Operand },
    Add { dst: SsaId, lhs: Operand, rhs: Operand },
    Sub { dst: SsaId, lhs: Operand, rhs: Operand },
    Mul { dst: SsaId, lhs: Operand, rhs: Operand },
    Div { dst: SsaId, lhs: Operand, rhs: Operand },
    Mod { dst: SsaId, lhs: Operand, rhs: Operand },
}

impl Instruction {
    /// The SSA local this instruction defines, if any.
    pub fn dst(&self) -> Option<SsaId> {
        match *self {
            Instruction::Ret { .. } => None,
            Instruction::Call { dst, .. }
            | Instruction::Dot { dst, .. }
            | Instruction::Load { dst, .. }
            | Instruction::Neg { dst, .. }
            | Instruction::Add { dst, .. }
            | Instruction::Sub { dst, .. }
            | Instruction::Mul { dst, .. }
            | Instruction::Div { dst, .. }
            | Instruction::Mod { dst, .. } => Some(dst),
        }
    }

    /// Visit every source operand, left to right.
    pub fn for_each_source(&self, mut f: impl FnMut(Operand)) {
        match *self {
            Instruction::Ret { value } => f(value),
            Instruction::Call { callee, args, .. } => {
                f(callee);
                f(args);
            }
            Instruction::Dot { tuple, index, .. } => {
                f(tuple);
                f(index);
            }
            Instruction::Load { src, .. } | Instruction::Neg { src, .. } => f(src),
            Instruction::Add { lhs, rhs, .. }
            | Instruction::Sub { lhs, rhs, .. }
            | Instruction::Mul { lhs, rhs, .. }
            | Instruction::Div { lhs, rhs, .. }
            | Instruction::Mod { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Ret { value } => write!(f, "ret {value}"),
            Instruction::Call { dst, callee, args } => {
                write!(f, "%{} = call {callee} {args}", dst.0)
            }
            Instruction::Dot { dst, tuple, index } => {
                write!(f, "%{} = dot {tuple} {index}", dst.0)
            }
            Instruction::Load { dst, src } => write!(f, "%{} = load {src}", dst.0),
            Instruction::Neg { dst, src } => write!(f, "%{} = neg {src}", dst.0),
            Instruction::Add { dst, lhs, rhs } => write!(f, "%{} = add {lhs} {rhs}", dst.0),
            Instruction::Sub { dst, lhs, rhs } => write!(f, "%{} = sub {lhs} {rhs}", dst.0),
            Instruction::Mul { dst, lhs, rhs } => write!(f, "%{} = mul {lhs} {rhs}", dst.0),
            Instruction::Div { dst, lhs, rhs } => write!(f, "%{} = div {lhs} {rhs}", dst.0),
            Instruction::Mod { dst, lhs, rhs } => write!(f, "%{} = mod {lhs} {rhs}", dst.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;

    #[test]
    fn ret_defines_nothing() {
        let ret = Instruction::Ret { value: Operand::Immediate(Scalar::I32(0)) };
        assert_eq!(ret.dst(), None);
    }

    #[test]
    fn defining_opcodes_expose_dst() {
        let add = Instruction::Add {
            dst: SsaId(2),
            lhs: Operand::Ssa(SsaId(0)),
            rhs: Operand::Ssa(SsaId(1)),
        };
        assert_eq!(add.dst(), Some(SsaId(2)));
    }

    #[test]
    fn source_visit_order() {
        let add = Instruction::Add {
            dst: SsaId(2),
            lhs: Operand::Ssa(SsaId(0)),
            rhs: Operand::Immediate(Scalar::I32(5)),
        };
        let mut seen = Vec::new();
        add.for_each_source(|op| seen.push(op));
        assert_eq!(
            seen,
            vec![Operand::Ssa(SsaId(0)), Operand::Immediate(Scalar::I32(5))]
        );
    }
}
