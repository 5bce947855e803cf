//! General-purpose registers.

use super::instruction::OperandSize;

/// The sixteen x86-64 general-purpose registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gpr {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

/// Integer argument registers of the System-V AMD64 ABI, in order.
pub const ARGUMENT_GPRS: [Gpr; 6] = [Gpr::Rdi, Gpr::Rsi, Gpr::Rdx, Gpr::Rcx, Gpr::R8, Gpr::R9];

/// Preference order when the allocator picks a free register.
///
/// Caller-saved registers come first so untouched callee-saved registers
/// never force prologue saves. `rax` and `rdx` sort late among the
/// caller-saved set: division, multiplication, and call results
/// commandeer them, and allocations parked there would just get
/// relocated. `rsp`/`rbp` are never allocated.
pub const ALLOCATION_ORDER: [Gpr; 14] = [
    Gpr::R10,
    Gpr::R11,
    Gpr::Rcx,
    Gpr::R8,
    Gpr::R9,
    Gpr::Rsi,
    Gpr::Rdi,
    Gpr::Rdx,
    Gpr::Rax,
    Gpr::Rbx,
    Gpr::R12,
    Gpr::R13,
    Gpr::R14,
    Gpr::R15,
];

impl Gpr {
    /// Bit index in the register pool bitset.
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Gpr {
        match index {
            0 => Gpr::Rax,
            1 => Gpr::Rcx,
            2 => Gpr::Rdx,
            3 => Gpr::Rbx,
            4 => Gpr::Rsp,
            5 => Gpr::Rbp,
            6 => Gpr::Rsi,
            7 => Gpr::Rdi,
            8 => Gpr::R8,
            9 => Gpr::R9,
            10 => Gpr::R10,
            11 => Gpr::R11,
            12 => Gpr::R12,
            13 => Gpr::R13,
            14 => Gpr::R14,
            15 => Gpr::R15,
            _ => panic!("no GPR with index {index}"),
        }
    }

    /// True for registers the callee must preserve (System-V: rbx, rbp,
    /// rsp, r12-r15).
    pub fn is_callee_saved(self) -> bool {
        matches!(self, Gpr::Rbx | Gpr::Rbp | Gpr::Rsp | Gpr::R12 | Gpr::R13 | Gpr::R14 | Gpr::R15)
    }

    /// AT&T register name for the given operand size, without the `%`.
    pub fn name(self, size: OperandSize) -> &'static str {
        const NAMES: [[&str; 4]; 16] = [
            ["al", "ax", "eax", "rax"],
            ["cl", "cx", "ecx", "rcx"],
            ["dl", "dx", "edx", "rdx"],
            ["bl", "bx", "ebx", "rbx"],
            ["spl", "sp", "esp", "rsp"],
            ["bpl", "bp", "ebp", "rbp"],
            ["sil", "si", "esi", "rsi"],
            ["dil", "di", "edi", "rdi"],
            ["r8b", "r8w", "r8d", "r8"],
            ["r9b", "r9w", "r9d", "r9"],
            ["r10b", "r10w", "r10d", "r10"],
            ["r11b", "r11w", "r11d", "r11"],
            ["r12b", "r12w", "r12d", "r12"],
            ["r13b", "r13w", "r13d", "r13"],
            ["r14b", "r14w", "r14d", "r14"],
            ["r15b", "r15w", "r15d", "r15"],
        ];
        let column = match size {
            OperandSize::Byte => 0,
            OperandSize::Word => 1,
            OperandSize::Long => 2,
            OperandSize::Quad => 3,
        };
        NAMES[self.index() as usize][column]
    }
}
