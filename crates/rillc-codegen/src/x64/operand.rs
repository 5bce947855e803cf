//! Selected-instruction operands.

use rillc_ir::LabelId;

use super::address::Address;
use super::gpr::Gpr;
use super::location::Location;

/// An operand of a selected x86-64 instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum X64Operand {
    Gpr(Gpr),
    Address(Address),
    Immediate(i64),
    /// A bare symbol name, used as a `call` target.
    Label(LabelId),
}

impl X64Operand {
    /// True when the operand is a memory reference.
    pub fn is_memory(self) -> bool {
        matches!(self, X64Operand::Address(_))
    }
}

impl From<Location> for X64Operand {
    fn from(location: Location) -> X64Operand {
        match location {
            Location::Gpr(gpr) => X64Operand::Gpr(gpr),
            Location::Address(address) => X64Operand::Address(address),
        }
    }
}

impl From<Gpr> for X64Operand {
    fn from(gpr: Gpr) -> X64Operand {
        X64Operand::Gpr(gpr)
    }
}

impl From<Address> for X64Operand {
    fn from(address: Address) -> X64Operand {
        X64Operand::Address(address)
    }
}
