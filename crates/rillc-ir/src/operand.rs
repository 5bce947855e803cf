//! Instruction operands.

use std::fmt;

use crate::scalar::Scalar;
use crate::{ConstId, LabelId, SsaId};

/// An instruction operand. Closed set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operand {
    /// A local in the current function.
    Ssa(SsaId),
    /// A compile-time scalar literal.
    Immediate(Scalar),
    /// Index into the module constant pool (tuples and anything too large
    /// for an immediate).
    Constant(ConstId),
    /// A global symbol (function or data).
    Label(LabelId),
}

impl Operand {
    /// The SSA id when this operand references a local.
    pub fn as_ssa(self) -> Option<SsaId> {
        match self {
            Operand::Ssa(ssa) => Some(ssa),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Ssa(ssa) => write!(f, "%{}", ssa.0),
            Operand::Immediate(scalar) => write!(f, "{scalar}"),
            Operand::Constant(id) => write!(f, "c{}", id.0),
            Operand::Label(id) => write!(f, "@{}", id.0),
        }
    }
}
