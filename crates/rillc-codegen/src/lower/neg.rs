//! `NEG dst, src` - arithmetic negation.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;
use crate::x64::instruction::X64Instruction;

impl FunctionLowerer<'_> {
    pub(super) fn lower_neg(&mut self, dst: SsaId, src: Operand, at: u32) {
        let allocation = match src {
            Operand::Ssa(source) => {
                let allocation = self.allocate_from_active(dst, source, at);
                // Allocating may spill the surviving source; read its
                // location afterwards.
                let source_location = self.allocator.location_of(source);
                self.copy_location(allocation.location, source_location, allocation.ty, at);
                allocation
            }
            _ => {
                let allocation = self.allocate(dst);
                self.load_allocation_from_operand(allocation, src, at);
                allocation
            }
        };
        let size = self.operand_size(allocation.ty);
        self.emit(X64Instruction::Neg { size, dst: allocation.location.into() });
    }
}
