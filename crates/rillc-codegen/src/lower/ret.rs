//! `RET src` - function return and epilogue.

use rillc_ir::Operand;

use super::FunctionLowerer;
use crate::x64::gpr::Gpr;
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    pub(super) fn lower_ret(&mut self, value: Operand, at: u32) {
        let return_type = self.function.return_type;
        if !self.context.types.is_scalar(return_type) {
            panic!("composite return values are not implemented");
        }

        match value {
            Operand::Ssa(source) => {
                let location = self.allocator.location_of(source);
                if location != Location::Gpr(Gpr::Rax) {
                    let size = self.operand_size(return_type);
                    self.emit(X64Instruction::Mov {
                        size,
                        dst: X64Operand::Gpr(Gpr::Rax),
                        src: location.into(),
                    });
                }
            }
            _ => self.load_gpr_from_operand(Gpr::Rax, value, at),
        }

        self.emit(X64Instruction::Mov {
            size: OperandSize::Quad,
            dst: X64Operand::Gpr(Gpr::Rsp),
            src: X64Operand::Gpr(Gpr::Rbp),
        });
        self.emit(X64Instruction::Pop { dst: X64Operand::Gpr(Gpr::Rbp) });
        self.emit(X64Instruction::Ret);
    }
}
