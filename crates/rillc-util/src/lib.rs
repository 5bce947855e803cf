//! rillc-util - Foundation types for the rill compiler
//!
//! This crate provides the small set of utilities every other rillc crate
//! builds on:
//!
//! - [`Symbol`] and the global string interner: identifiers and label names
//!   are interned once and compared by index thereafter.
//! - [`Idx`] and [`IndexVec`]: typed u32-backed indices so that SSA locals,
//!   types, constants, and labels each live in their own index space and
//!   cannot be confused with one another.
//! - [`Bitset16`]: a 16-slot bitset backing the register pool.
//!
//! Nothing in this crate knows about the compiler pipeline; it is pure
//! infrastructure.

pub mod bitset;
pub mod index_vec;
pub mod symbol;

pub use bitset::Bitset16;
pub use index_vec::{Idx, IndexVec};
pub use symbol::Symbol;
