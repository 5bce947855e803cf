//! One local's allocation record.

use rillc_ir::{Lifetime, SsaId, TypeId};

use crate::x64::Location;

/// Where one SSA local lives, together with the interval the placement is
/// valid for. Produced and updated by the allocator; read by the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub ssa: SsaId,
    pub lifetime: Lifetime,
    pub location: Location,
    pub ty: TypeId,
}

impl Allocation {
    /// True when the local is still needed at instruction `index`.
    pub fn alive_at(&self, index: u32) -> bool {
        !self.lifetime.expired_at(index)
    }
}
