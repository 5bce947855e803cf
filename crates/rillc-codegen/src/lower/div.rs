//! `DIV dst, lhs, rhs` and `MOD dst, lhs, rhs` - signed division.
//!
//! `idiv` divides `%rdx:%rax` by one reg/mem operand, leaving the quotient
//! in `%rax` and the remainder in `%rdx`. The dividend's high half comes
//! from the sign-extension instruction (`cltd`/`cqto`), which is what
//! makes negative dividends come out right.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;
use crate::x64::gpr::Gpr;
use crate::x64::instruction::X64Instruction;
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    pub(super) fn lower_div(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32) {
        self.lower_division(dst, lhs, rhs, at, false);
    }

    pub(super) fn lower_rem(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32) {
        self.lower_division(dst, lhs, rhs, at, true);
    }

    fn lower_division(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32, remainder: bool) {
        let size = self.operand_size(self.local_type(dst));

        // Fence %rdx first: the sign extension overwrites it, and nothing
        // below may park a relocated value there.
        self.acquire_gpr(Gpr::Rdx);

        // The divisor must survive in a register idiv does not clobber.
        if let Some(r) = rhs.as_ssa() {
            if self.allocator.location_of(r) == Location::Gpr(Gpr::Rax) {
                self.reallocate_active(r);
            }
        }

        // Dividend into %rax.
        let lhs_occupies_rax = lhs.as_ssa().is_some_and(|l| {
            self.allocator.location_of(l) == Location::Gpr(Gpr::Rax) && self.dies_at(l, at)
        });
        let mut rax_scratch = false;
        if remainder {
            if !lhs_occupies_rax {
                self.acquire_gpr(Gpr::Rax);
                rax_scratch = true;
                self.load_gpr_from_operand(Gpr::Rax, lhs, at);
            }
        } else if lhs_occupies_rax {
            let l = lhs.as_ssa().unwrap();
            self.allocate_from_active(dst, l, at);
        } else {
            self.allocate_to_gpr(dst, Gpr::Rax);
            self.load_gpr_from_operand(Gpr::Rax, lhs, at);
        }

        // Divisor as a reg/mem operand; immediates go through a scratch.
        let (src, scratch) = match rhs {
            Operand::Ssa(ssa) => (self.allocator.location_of(ssa).into(), None),
            Operand::Immediate(_) | Operand::Constant(_) => {
                let value = self.scalar_operand(rhs);
                let scratch = self.acquire_any_gpr();
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(scratch),
                    src: value,
                });
                (X64Operand::Gpr(scratch), Some(scratch))
            }
            Operand::Label(_) => {
                let value = self.scalar_operand(rhs);
                let scratch = self.acquire_any_gpr();
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(scratch),
                    src: value,
                });
                (X64Operand::Gpr(scratch), Some(scratch))
            }
        };

        self.emit(X64Instruction::Cdq { size });
        self.emit(X64Instruction::Idiv { size, src });

        if let Some(scratch) = scratch {
            self.release_gpr(scratch);
        }
        if remainder {
            if rax_scratch {
                self.release_gpr(Gpr::Rax);
            }
            // The remainder materialised in %rdx; hand the register over
            // from scratch hold to the destination's allocation.
            self.release_gpr(Gpr::Rdx);
            self.allocate_to_gpr(dst, Gpr::Rdx);
        } else {
            self.release_gpr(Gpr::Rdx);
        }
    }
}
