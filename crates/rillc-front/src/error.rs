//! Front-end diagnostics.
//!
//! Every error carries the source position it was raised at; the driver
//! prefixes the file path when reporting. The core never sees any of
//! these: compilation stops at the first front-end error.

use std::fmt;

use thiserror::Error;

use rillc_util::Symbol;

/// A line/column position in the source file. 1-based, in characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Everything the front end can object to.
#[derive(Debug, Error)]
pub enum FrontError {
    #[error("{location}: unexpected character {found:?}")]
    UnexpectedChar { found: char, location: SourceLocation },

    #[error("{location}: integer literal out of range")]
    IntegerOutOfRange { location: SourceLocation },

    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String, location: SourceLocation },

    #[error("{location}: tuple index is not a compile-time constant")]
    TupleIndexNotConstant { location: SourceLocation },

    #[error("{location}: undefined symbol `{name}`")]
    UndefinedSymbol { name: Symbol, location: SourceLocation },

    #[error("{location}: `{name}` is defined twice")]
    DuplicateDefinition { name: Symbol, location: SourceLocation },

    #[error("{location}: type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String, location: SourceLocation },

    #[error("{location}: type {found} cannot be indexed")]
    NotIndexable { found: String, location: SourceLocation },

    #[error("{location}: tuple index {index} is out of bounds for a tuple of {len} elements")]
    TupleIndexOutOfBounds { index: u64, len: usize, location: SourceLocation },

    #[error("{location}: {found} is not callable")]
    NotCallable { found: String, location: SourceLocation },

    #[error("{location}: expected {expected} arguments, found {found}")]
    ArgumentCountMismatch { expected: usize, found: usize, location: SourceLocation },

    #[error("{location}: global initialiser is not a compile-time constant")]
    NotConstant { location: SourceLocation },

    #[error("{location}: unreachable statement after return")]
    UnreachableCode { location: SourceLocation },

    #[error("{location}: function body does not return a value")]
    MissingReturn { location: SourceLocation },
}

impl FrontError {
    /// The position the diagnostic points at.
    pub fn location(&self) -> SourceLocation {
        match self {
            FrontError::UnexpectedChar { location, .. }
            | FrontError::IntegerOutOfRange { location }
            | FrontError::UnexpectedToken { location, .. }
            | FrontError::TupleIndexNotConstant { location }
            | FrontError::UndefinedSymbol { location, .. }
            | FrontError::DuplicateDefinition { location, .. }
            | FrontError::TypeMismatch { location, .. }
            | FrontError::NotIndexable { location, .. }
            | FrontError::TupleIndexOutOfBounds { location, .. }
            | FrontError::NotCallable { location, .. }
            | FrontError::ArgumentCountMismatch { location, .. }
            | FrontError::NotConstant { location }
            | FrontError::UnreachableCode { location }
            | FrontError::MissingReturn { location } => *location,
        }
    }
}
