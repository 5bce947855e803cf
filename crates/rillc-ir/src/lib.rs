//! rillc-ir - Typed intermediate representation of the rill compiler
//!
//! The front end lowers each source file into the structures defined here;
//! the code generator consumes them. The IR is an SSA linear bytecode of
//! three-address instructions over a closed operand set, plus the
//! module-scope tables (interned types, constant pool, label table, symbol
//! table) aggregated in [`Context`].
//!
//! Everything is handle-based: SSA locals, types, constants, and labels are
//! small typed indices into vectors owned by the [`Context`] or the current
//! [`Function`]. Passes stay free of pointer graphs and are deterministic by
//! construction.

pub mod context;
pub mod evaluate;
pub mod function;
pub mod instruction;
pub mod operand;
pub mod scalar;
pub mod types;
pub mod value;

pub use context::{Constant, Context, SymbolEntry, SymbolKind};
pub use evaluate::evaluate;
pub use function::{FormalArgument, Function, Lifetime, Local};
pub use instruction::Instruction;
pub use operand::Operand;
pub use scalar::{Scalar, ScalarKind};
pub use types::{Type, TypeInterner, TupleLayout};
pub use value::{Tuple, Value};

rillc_util::new_index_type! {
    /// Identifies an SSA local within one function.
    pub struct SsaId;
}

rillc_util::new_index_type! {
    /// Handle of an interned type.
    pub struct TypeId;
}

rillc_util::new_index_type! {
    /// Index into the module constant pool.
    pub struct ConstId;
}

rillc_util::new_index_type! {
    /// Index into the module label table.
    pub struct LabelId;
}
