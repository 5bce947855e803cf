//! Where an SSA local lives after allocation.

use super::address::Address;
use super::gpr::Gpr;

/// The location the allocator assigned to a local: a register or memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Gpr(Gpr),
    Address(Address),
}

impl Location {
    pub fn gpr(gpr: Gpr) -> Location {
        Location::Gpr(gpr)
    }

    pub fn stack(offset: i32) -> Location {
        Location::Address(Address::base_offset(Gpr::Rbp, offset))
    }

    pub fn as_gpr(self) -> Option<Gpr> {
        match self {
            Location::Gpr(gpr) => Some(gpr),
            Location::Address(_) => None,
        }
    }

    pub fn as_address(self) -> Option<Address> {
        match self {
            Location::Address(address) => Some(address),
            Location::Gpr(_) => None,
        }
    }

    /// True when the value lives in memory.
    pub fn is_memory(self) -> bool {
        matches!(self, Location::Address(_))
    }
}
