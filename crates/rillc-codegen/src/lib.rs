//! rillc-codegen - x86-64 back end of the rill compiler
//!
//! The pipeline over one module, leaves first:
//!
//! 1. [`lifetimes`] computes the `(first_use, last_use)` interval of every
//!    SSA local of a function.
//! 2. [`allocator`] assigns each local a [`x64::Location`] - a general
//!    purpose register or a stack slot - by linear scan over those
//!    intervals, growing the stack frame when registers run out.
//! 3. [`lower`] walks the IR and selects x86-64 instructions, consulting
//!    the allocator to realise each operand.
//! 4. [`emit`] serialises the selected instructions and the module's data
//!    symbols to one UTF-8 buffer of GNU `as` AT&T assembly.
//!
//! The whole back end is single-threaded, non-fallible, and deterministic:
//! given the same IR and interner state it produces a byte-identical
//! buffer. Invariant violations are bugs in upstream passes and abort.

pub mod allocator;
pub mod directives;
pub mod emit;
pub mod frame;
pub mod lifetimes;
pub mod lower;
pub mod x64;

mod intrinsics;

pub use emit::emit_module;
pub use lower::{select_function, SelectedFunction};
