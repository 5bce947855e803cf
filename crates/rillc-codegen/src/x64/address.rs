//! Memory addresses.

use rillc_ir::LabelId;

use super::gpr::Gpr;

/// What an address is computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressBase {
    /// A base register, usually `%rbp` (frame slots) or `%rsp` (outgoing
    /// call arguments).
    Gpr(Gpr),
    /// A global symbol, addressed rip-relative: `name+offset(%rip)`.
    Label(LabelId),
}

/// An x86-64 effective address: `offset(base, index, scale)`.
///
/// Equality is structural over all fields; the allocator and the copy
/// intrinsic compare locations this way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address {
    pub base: AddressBase,
    pub index: Option<Gpr>,
    /// Element scale, one of 1, 2, 4, 8. Only meaningful with an index.
    pub scale: u8,
    pub offset: i32,
}

impl Address {
    /// A `base + offset` address.
    pub fn base_offset(base: Gpr, offset: i32) -> Address {
        Address { base: AddressBase::Gpr(base), index: None, scale: 1, offset }
    }

    /// An indexed address `offset(base, index, scale)`.
    pub fn indexed(base: Gpr, index: Gpr, scale: u8, offset: i32) -> Address {
        debug_assert!(matches!(scale, 1 | 2 | 4 | 8), "invalid scale {scale}");
        Address { base: AddressBase::Gpr(base), index: Some(index), scale, offset }
    }

    /// The rip-relative address of a global symbol.
    pub fn from_label(label: LabelId) -> Address {
        Address { base: AddressBase::Label(label), index: None, scale: 1, offset: 0 }
    }

    /// The same address displaced by `delta` bytes.
    ///
    /// # Panics
    ///
    /// Panics when the displaced offset leaves the signed 32-bit range.
    pub fn offset_by(self, delta: i64) -> Address {
        let offset = i64::from(self.offset) + delta;
        let offset = i32::try_from(offset)
            .unwrap_or_else(|_| panic!("address displacement {offset} exceeds 32 bits"));
        Address { offset, ..self }
    }
}
