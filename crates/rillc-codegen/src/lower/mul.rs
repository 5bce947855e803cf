//! `MUL dst, lhs, rhs` - signed multiply.
//!
//! Lowered to the one-operand `imul`, which multiplies `%rax` by one
//! reg/mem operand and leaves the product in `%rdx:%rax`. `%rdx` is
//! therefore held as scratch for the duration; the low half in `%rax` is
//! the result.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;
use crate::x64::address::Address;
use crate::x64::gpr::Gpr;
use crate::x64::instruction::X64Instruction;
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    pub(super) fn lower_mul(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32) {
        let size = self.operand_size(self.local_type(dst));

        // The high half lands in %rdx; fence it (relocating any live
        // occupant) before anything else is placed.
        self.acquire_gpr(Gpr::Rdx);

        // Pick the multiplier that stays a reg/mem operand. A factor that
        // already sits in %rax and dies here donates %rax to the result.
        let multiplier = if let Some(l) = lhs.as_ssa().filter(|&l| {
            self.allocator.location_of(l) == Location::Gpr(Gpr::Rax) && self.dies_at(l, at)
        }) {
            self.allocate_from_active(dst, l, at);
            rhs
        } else if let Some(r) = rhs.as_ssa().filter(|&r| {
            self.allocator.location_of(r) == Location::Gpr(Gpr::Rax) && self.dies_at(r, at)
        }) {
            self.allocate_from_active(dst, r, at);
            lhs
        } else {
            let (into_rax, multiplier) = match (lhs.as_ssa(), rhs.as_ssa()) {
                // Both factors are locals: move the one with the shorter
                // remaining lifetime, keeping the longer-lived value where
                // later instructions expect it.
                (Some(l), Some(r)) => {
                    if self.lifetime_of(l).last_use <= self.lifetime_of(r).last_use {
                        (lhs, rhs)
                    } else {
                        (rhs, lhs)
                    }
                }
                // One local: the literal goes through %rax, the local is
                // already a reg/mem operand.
                (Some(_), None) => (rhs, lhs),
                _ => (lhs, rhs),
            };
            self.allocate_to_gpr(dst, Gpr::Rax);
            self.load_gpr_from_operand(Gpr::Rax, into_rax, at);
            multiplier
        };

        let src = match multiplier {
            Operand::Ssa(ssa) => self.allocator.location_of(ssa).into(),
            Operand::Immediate(_) | Operand::Constant(_) => {
                // imul takes no immediate in the one-operand form;
                // materialise through the already-held %rdx.
                let value = self.scalar_operand(multiplier);
                self.emit(X64Instruction::Mov { size, dst: X64Operand::Gpr(Gpr::Rdx), src: value });
                X64Operand::Gpr(Gpr::Rdx)
            }
            Operand::Label(label) => Address::from_label(label).into(),
        };
        self.emit(X64Instruction::Imul { size, src });
        self.release_gpr(Gpr::Rdx);
    }
}
