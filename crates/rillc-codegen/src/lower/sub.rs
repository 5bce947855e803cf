//! `SUB dst, lhs, rhs`.

use rillc_ir::{Operand, SsaId};

use super::{ArithKind, FunctionLowerer};

impl FunctionLowerer<'_> {
    pub(super) fn lower_sub(&mut self, dst: SsaId, lhs: Operand, rhs: Operand, at: u32) {
        let size = self.operand_size(self.local_type(dst));

        // Subtraction does not commute: only the left operand's location
        // can be reused for the destination.
        if let Some(l) = lhs.as_ssa() {
            if self.dies_at(l, at) {
                let allocation = self.allocate_from_active(dst, l, at);
                let rhs = self.scalar_operand(rhs);
                self.emit_arith(ArithKind::Sub, allocation.location, rhs, size);
                return;
            }
        }

        let allocation = self.allocate(dst);
        self.load_allocation_from_operand(allocation, lhs, at);
        let rhs = self.scalar_operand(rhs);
        self.emit_arith(ArithKind::Sub, allocation.location, rhs, size);
    }
}
