//! The copy intrinsic.
//!
//! Copies a typed value between locations or raw addresses. A scalar is a
//! single `mov`, with a scratch register bridging memory-to-memory moves;
//! a composite recurses over the tuple layout, bottoming out in aligned
//! 8/4/2/1-byte scalar moves.

use rillc_ir::{Type, TypeId};

use crate::allocator::Allocation;
use crate::lower::FunctionLowerer;
use crate::x64::address::Address;
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    /// Copy a `ty`-typed value from `src` to `dst`. No-op when the
    /// locations coincide.
    pub(crate) fn copy_location(&mut self, dst: Location, src: Location, ty: TypeId, at: u32) {
        if dst == src {
            return;
        }
        if self.context.types.is_scalar(ty) {
            let size = self.operand_size(ty);
            if dst.is_memory() && src.is_memory() {
                let dst = dst.as_address().unwrap();
                let src = src.as_address().unwrap();
                self.copy_scalar_memory(dst, src, size, at);
            } else {
                self.emit(X64Instruction::Mov { size, dst: dst.into(), src: src.into() });
            }
        } else {
            let dst = dst.as_address().expect("composite value outside memory");
            let src = src.as_address().expect("composite value outside memory");
            self.copy_memory(dst, src, ty, at);
        }
    }

    /// Copy `ty`-typed data between two memory addresses.
    pub(crate) fn copy_memory(&mut self, dst: Address, src: Address, ty: TypeId, at: u32) {
        match self.context.types.get(ty) {
            Type::Scalar(kind) => {
                let size = OperandSize::from_bytes(kind.size());
                self.copy_scalar_memory(dst, src, size, at);
            }
            Type::Tuple(_) => {
                let layout = self.context.types.tuple_layout(ty);
                for (field_ty, offset) in layout.fields {
                    let delta = offset as i64;
                    self.copy_memory(dst.offset_by(delta), src.offset_by(delta), field_ty, at);
                }
            }
            Type::Function { .. } => panic!("copy of a function value"),
        }
    }

    /// One scalar memory-to-memory move through a scratch register.
    pub(crate) fn copy_scalar_memory(
        &mut self,
        dst: Address,
        src: Address,
        size: OperandSize,
        _at: u32,
    ) {
        let scratch = self.acquire_any_gpr();
        self.emit(X64Instruction::Mov {
            size,
            dst: X64Operand::Gpr(scratch),
            src: X64Operand::Address(src),
        });
        self.emit(X64Instruction::Mov {
            size,
            dst: X64Operand::Address(dst),
            src: X64Operand::Gpr(scratch),
        });
        self.release_gpr(scratch);
    }

    /// Fill an allocation from a memory address holding a value of the
    /// allocation's type.
    pub(crate) fn copy_allocation_from_memory(
        &mut self,
        allocation: Allocation,
        src: Address,
        at: u32,
    ) {
        match allocation.location {
            Location::Gpr(gpr) => {
                let size = self.operand_size(allocation.ty);
                self.emit(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(gpr),
                    src: X64Operand::Address(src),
                });
            }
            Location::Address(dst) => self.copy_memory(dst, src, allocation.ty, at),
        }
    }
}
