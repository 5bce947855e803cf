//! `ADD dst, lhs, rhs`.

use rillc_ir::{Operand, SsaId};

use super::{ArithKind, FunctionLowerer};

impl FunctionLowerer<'_> {
    pub(super) fn lower_add(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32) {
        let size = self.operand_size(self.local_type(dst));

        // Addition commutes, so either operand dying at this instruction
        // can donate its location to the destination.
        if let Some(l) = lhs.as_ssa() {
            if self.dies_at(l, at) {
                let allocation = self.allocate_from_active(dst, l, at);
                let rhs = self.scalar_operand(rhs);
                self.emit_arith(ArithKind::Add, allocation.location, rhs, size);
                return;
            }
        }
        if let Some(r) = rhs.as_ssa() {
            if self.dies_at(r, at) {
                let allocation = self.allocate_from_active(dst, r, at);
                let lhs = self.scalar_operand(lhs);
                self.emit_arith(ArithKind::Add, allocation.location, lhs, size);
                return;
            }
        }

        let allocation = self.allocate(dst);
        self.load_allocation_from_operand(allocation, lhs, at);
        let rhs = self.scalar_operand(rhs);
        self.emit_arith(ArithKind::Add, allocation.location, rhs, size);
    }
}
