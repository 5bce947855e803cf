//! The load intrinsics: realise an IR operand into a given target form.

use rillc_ir::{Operand, TypeId, Value};

use crate::allocator::Allocation;
use crate::lower::FunctionLowerer;
use crate::x64::address::Address;
use crate::x64::gpr::Gpr;
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    /// Load the value of a scalar operand into `gpr`.
    pub(crate) fn load_gpr_from_operand(&mut self, gpr: Gpr, operand: Operand, _at: u32) {
        match operand {
            Operand::Ssa(ssa) => {
                let allocation = self.allocator.allocation_of(ssa);
                if allocation.location == Location::Gpr(gpr) {
                    return;
                }
                let size = self.operand_size(allocation.ty);
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(gpr),
                    src: allocation.location.into(),
                });
            }
            Operand::Immediate(scalar) => {
                let kind = scalar.kind().expect("uninitialized immediate");
                self.emit(X64Instruction::Mov {
                    size: OperandSize::from_bytes(kind.size()),
                    dst: X64Operand::Gpr(gpr),
                    src: X64Operand::Immediate(scalar.as_i64()),
                });
            }
            Operand::Constant(id) => {
                let constant = self.context.constants_at(id);
                let scalar = constant
                    .value
                    .as_scalar()
                    .expect("tuple constant loaded into a register");
                let size = self.operand_size(constant.ty);
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(gpr),
                    src: X64Operand::Immediate(scalar.as_i64()),
                });
            }
            Operand::Label(label) => {
                let name = self.context.labels_at(label);
                let ty = self
                    .context
                    .symbol(name)
                    .unwrap_or_else(|| panic!("label {name} has no symbol"))
                    .ty;
                let size = self.operand_size(ty);
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(gpr),
                    src: X64Operand::Address(Address::from_label(label)),
                });
            }
        }
    }

    /// Store the value of an operand of type `ty` into memory at `address`.
    pub(crate) fn load_address_from_operand(
        &mut self,
        address: Address,
        operand: Operand,
        ty: TypeId,
        at: u32,
    ) {
        match operand {
            Operand::Ssa(ssa) => {
                let source = self.allocator.location_of(ssa);
                self.copy_location(Location::Address(address), source, ty, at);
            }
            Operand::Immediate(scalar) => {
                let kind = scalar.kind().expect("uninitialized immediate");
                self.emit(X64Instruction::Mov {
                    size: OperandSize::from_bytes(kind.size()),
                    dst: X64Operand::Address(address),
                    src: X64Operand::Immediate(scalar.as_i64()),
                });
            }
            Operand::Constant(id) => {
                let constant = self.context.constants_at(id);
                match constant.value.clone() {
                    Value::Scalar(scalar) => {
                        let size = self.operand_size(constant.ty);
                        self.emit(X64Instruction::Mov {
                            size,
                            dst: X64Operand::Address(address),
                            src: X64Operand::Immediate(scalar.as_i64()),
                        });
                    }
                    Value::Tuple(tuple) => {
                        let layout = self.context.types.tuple_layout(ty);
                        debug_assert_eq!(layout.fields.len(), tuple.elements.len());
                        for (element, (field_ty, offset)) in
                            tuple.elements.into_iter().zip(layout.fields)
                        {
                            self.load_address_from_operand(
                                address.offset_by(offset as i64),
                                element,
                                field_ty,
                                at,
                            );
                        }
                    }
                }
            }
            Operand::Label(label) => {
                self.copy_memory(address, Address::from_label(label), ty, at);
            }
        }
    }

    /// Fill `allocation` from an operand, dispatching on where the
    /// allocation lives.
    pub(crate) fn load_allocation_from_operand(
        &mut self,
        allocation: Allocation,
        operand: Operand,
        at: u32,
    ) {
        match allocation.location {
            Location::Gpr(gpr) => self.load_gpr_from_operand(gpr, operand, at),
            Location::Address(address) => {
                self.load_address_from_operand(address, operand, allocation.ty, at)
            }
        }
    }
}
