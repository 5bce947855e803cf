//! Selected x86-64 instructions and their AT&T rendering.

use std::fmt::Write;

use rillc_ir::Context;

use super::address::{Address, AddressBase};
use super::gpr::Gpr;
use super::operand::X64Operand;

/// Width of a data operand; picks the mnemonic suffix and register names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSize {
    Byte,
    Word,
    Long,
    Quad,
}

impl OperandSize {
    /// Size from a type's byte width.
    ///
    /// # Panics
    ///
    /// Panics on widths with no single machine operand; composites are
    /// copied field-wise before any instruction sees them.
    pub fn from_bytes(bytes: u64) -> OperandSize {
        match bytes {
            1 => OperandSize::Byte,
            2 => OperandSize::Word,
            4 => OperandSize::Long,
            8 => OperandSize::Quad,
            _ => panic!("no operand size for {bytes} bytes"),
        }
    }

    pub fn bytes(self) -> u64 {
        match self {
            OperandSize::Byte => 1,
            OperandSize::Word => 2,
            OperandSize::Long => 4,
            OperandSize::Quad => 8,
        }
    }

    /// The AT&T mnemonic suffix.
    pub fn suffix(self) -> char {
        match self {
            OperandSize::Byte => 'b',
            OperandSize::Word => 'w',
            OperandSize::Long => 'l',
            OperandSize::Quad => 'q',
        }
    }
}

/// One selected instruction. `dst`/`src` mirror the Intel-order fields the
/// selector thinks in; rendering emits AT&T order (source first).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum X64Instruction {
    Ret,
    Call { target: X64Operand },
    Push { src: X64Operand },
    Pop { dst: X64Operand },
    Mov { size: OperandSize, dst: X64Operand, src: X64Operand },
    Lea { dst: Gpr, src: Address },
    Neg { size: OperandSize, dst: X64Operand },
    Add { size: OperandSize, dst: X64Operand, src: X64Operand },
    Sub { size: OperandSize, dst: X64Operand, src: X64Operand },
    /// One-operand signed multiply: `rdx:rax = rax * src`.
    Imul { size: OperandSize, src: X64Operand },
    /// One-operand signed divide: `rax, rdx = rdx:rax / src`.
    Idiv { size: OperandSize, src: X64Operand },
    /// Sign-extend `rax` into `rdx` (`cltd` for long, `cqto` for quad);
    /// sets up the dividend for `Idiv`.
    Cdq { size: OperandSize },
    Syscall,
}

impl X64Instruction {
    /// Append the AT&T rendering of this instruction to `buffer`.
    pub fn render(&self, buffer: &mut String, context: &Context) {
        match *self {
            X64Instruction::Ret => buffer.push_str("\tret\n"),
            X64Instruction::Call { target } => {
                buffer.push_str("\tcall\t");
                render_operand(buffer, target, OperandSize::Quad, context);
                buffer.push('\n');
            }
            X64Instruction::Push { src } => {
                buffer.push_str("\tpushq\t");
                render_operand(buffer, src, OperandSize::Quad, context);
                buffer.push('\n');
            }
            X64Instruction::Pop { dst } => {
                buffer.push_str("\tpopq\t");
                render_operand(buffer, dst, OperandSize::Quad, context);
                buffer.push('\n');
            }
            X64Instruction::Mov { size, dst, src } => {
                let _ = write!(buffer, "\tmov{}\t", size.suffix());
                render_operand(buffer, src, size, context);
                buffer.push_str(", ");
                render_operand(buffer, dst, size, context);
                buffer.push('\n');
            }
            X64Instruction::Lea { dst, src } => {
                buffer.push_str("\tleaq\t");
                render_address(buffer, src, context);
                let _ = write!(buffer, ", %{}", dst.name(OperandSize::Quad));
                buffer.push('\n');
            }
            X64Instruction::Neg { size, dst } => {
                let _ = write!(buffer, "\tneg{}\t", size.suffix());
                render_operand(buffer, dst, size, context);
                buffer.push('\n');
            }
            X64Instruction::Add { size, dst, src } => {
                let _ = write!(buffer, "\tadd{}\t", size.suffix());
                render_operand(buffer, src, size, context);
                buffer.push_str(", ");
                render_operand(buffer, dst, size, context);
                buffer.push('\n');
            }
            X64Instruction::Sub { size, dst, src } => {
                let _ = write!(buffer, "\tsub{}\t", size.suffix());
                render_operand(buffer, src, size, context);
                buffer.push_str(", ");
                render_operand(buffer, dst, size, context);
                buffer.push('\n');
            }
            X64Instruction::Imul { size, src } => {
                let _ = write!(buffer, "\timul{}\t", size.suffix());
                render_operand(buffer, src, size, context);
                buffer.push('\n');
            }
            X64Instruction::Idiv { size, src } => {
                let _ = write!(buffer, "\tidiv{}\t", size.suffix());
                render_operand(buffer, src, size, context);
                buffer.push('\n');
            }
            X64Instruction::Cdq { size } => match size {
                OperandSize::Long => buffer.push_str("\tcltd\n"),
                OperandSize::Quad => buffer.push_str("\tcqto\n"),
                _ => panic!("no sign-extension mnemonic for {size:?}"),
            },
            X64Instruction::Syscall => buffer.push_str("\tsyscall\n"),
        }
    }
}

fn render_operand(buffer: &mut String, operand: X64Operand, size: OperandSize, context: &Context) {
    match operand {
        X64Operand::Gpr(gpr) => {
            let _ = write!(buffer, "%{}", gpr.name(size));
        }
        X64Operand::Address(address) => render_address(buffer, address, context),
        X64Operand::Immediate(value) => {
            let _ = write!(buffer, "${value}");
        }
        X64Operand::Label(label) => {
            let _ = write!(buffer, "{}", context.labels_at(label));
        }
    }
}

fn render_address(buffer: &mut String, address: Address, context: &Context) {
    match address.base {
        AddressBase::Gpr(base) => {
            if address.offset != 0 {
                let _ = write!(buffer, "{}", address.offset);
            }
            let _ = write!(buffer, "(%{}", base.name(OperandSize::Quad));
            if let Some(index) = address.index {
                let _ = write!(buffer, ", %{}, {}", index.name(OperandSize::Quad), address.scale);
            }
            buffer.push(')');
        }
        AddressBase::Label(label) => {
            let _ = write!(buffer, "{}", context.labels_at(label));
            if address.offset != 0 {
                let _ = write!(buffer, "+{}", address.offset);
            }
            buffer.push_str("(%rip)");
        }
    }
}
