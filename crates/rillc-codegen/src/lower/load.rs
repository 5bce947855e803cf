//! `LOAD dst, src` - copy or initialise a local.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;

impl FunctionLowerer<'_> {
    pub(super) fn lower_load(&mut self, dst: SsaId, src: Operand, at: u32) {
        match src {
            Operand::Ssa(source) => {
                let allocation = self.allocate_from_active(dst, source, at);
                // A dying source was reused in place (the copy degenerates
                // to a no-op); a surviving one needs its value copied into
                // the fresh location. Allocating may itself have spilled
                // the source, so its location is read afterwards.
                let source_location = self.allocator.location_of(source);
                self.copy_location(allocation.location, source_location, allocation.ty, at);
            }
            Operand::Immediate(_) | Operand::Constant(_) | Operand::Label(_) => {
                let allocation = self.allocate(dst);
                self.load_allocation_from_operand(allocation, src, at);
            }
        }
    }
}
