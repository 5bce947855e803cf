//! The x86-64 machine model: registers, addresses, locations, operands,
//! and the selected-instruction representation the emitter serialises.

pub mod address;
pub mod gpr;
pub mod instruction;
pub mod location;
pub mod operand;

pub use address::{Address, AddressBase};
pub use gpr::Gpr;
pub use instruction::{OperandSize, X64Instruction};
pub use location::Location;
pub use operand::X64Operand;
