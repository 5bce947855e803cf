//! `DOT dst, tuple, index` - tuple element access.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;
use crate::x64::address::Address;

impl FunctionLowerer<'_> {
    pub(super) fn lower_dot(&mut self, dst: SsaId, tuple: Operand, index: Operand, at: u32) {
        // The front end guarantees a compile-time integer index.
        let index = match index {
            Operand::Immediate(scalar) => scalar.as_i64() as usize,
            _ => panic!("tuple index is not a compile-time constant"),
        };

        match tuple {
            // A tuple literal never materialises for an element read; the
            // element operand is loaded directly.
            Operand::Constant(id) => {
                let element = {
                    let constant = self.context.constants_at(id);
                    let tuple = constant.value.as_tuple().expect("dot on a non-tuple constant");
                    tuple.elements[index]
                };
                let allocation = self.allocate(dst);
                self.load_allocation_from_operand(allocation, element, at);
            }
            // A tuple-typed local lives in memory; compute the element's
            // address from the layout and copy it out.
            Operand::Ssa(source) => {
                let source_allocation = self.allocator.allocation_of(source);
                let layout = self.context.types.tuple_layout(source_allocation.ty);
                let (_, offset) = layout.fields[index];
                let base = source_allocation
                    .location
                    .as_address()
                    .expect("tuple local outside memory");
                let element = base.offset_by(offset as i64);
                let allocation = self.allocate(dst);
                self.copy_allocation_from_memory(allocation, element, at);
            }
            // Global tuple data, addressed rip-relative.
            Operand::Label(label) => {
                let name = self.context.labels_at(label);
                let ty = self
                    .context
                    .symbol(name)
                    .unwrap_or_else(|| panic!("label {name} has no symbol"))
                    .ty;
                let layout = self.context.types.tuple_layout(ty);
                let (_, offset) = layout.fields[index];
                let element = Address::from_label(label).offset_by(offset as i64);
                let allocation = self.allocate(dst);
                self.copy_allocation_from_memory(allocation, element, at);
            }
            Operand::Immediate(_) => panic!("dot on a scalar operand"),
        }
    }
}
