//! Scalar kinds and scalar constants.

use std::fmt;

/// The primitive scalar kinds.
///
/// The MVP surface language only produces `I32`, `Bool`, and `Nil`; the
/// model carries the full integer family so the backend's size/alignment
/// logic does not need revisiting when the front end grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    Nil,
}

impl ScalarKind {
    /// Every kind, in a fixed order used to pre-intern scalar types.
    pub const ALL: [ScalarKind; 10] = [
        ScalarKind::I8,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::I64,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::U64,
        ScalarKind::Bool,
        ScalarKind::Nil,
    ];

    /// Position of this kind within [`ScalarKind::ALL`].
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|&k| k == self).unwrap()
    }

    /// Size in bytes.
    pub fn size(self) -> u64 {
        match self {
            ScalarKind::I8 | ScalarKind::U8 | ScalarKind::Bool | ScalarKind::Nil => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 => 4,
            ScalarKind::I64 | ScalarKind::U64 => 8,
        }
    }

    /// Alignment in bytes. Equal to the size for every scalar kind.
    pub fn align(self) -> u64 {
        self.size()
    }
}

/// A compile-time scalar constant.
///
/// `Uninitialized` marks a declared-but-unset slot (uninitialised global
/// data); it compares unequal to everything, including itself, so equality
/// is only meaningful between initialised values of the same kind.
#[derive(Clone, Copy, Debug)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bool(bool),
    Nil,
    Uninitialized,
}

impl Scalar {
    /// The kind of an initialised scalar; `None` for `Uninitialized`.
    pub fn kind(self) -> Option<ScalarKind> {
        match self {
            Scalar::I8(_) => Some(ScalarKind::I8),
            Scalar::I16(_) => Some(ScalarKind::I16),
            Scalar::I32(_) => Some(ScalarKind::I32),
            Scalar::I64(_) => Some(ScalarKind::I64),
            Scalar::U8(_) => Some(ScalarKind::U8),
            Scalar::U16(_) => Some(ScalarKind::U16),
            Scalar::U32(_) => Some(ScalarKind::U32),
            Scalar::U64(_) => Some(ScalarKind::U64),
            Scalar::Bool(_) => Some(ScalarKind::Bool),
            Scalar::Nil => Some(ScalarKind::Nil),
            Scalar::Uninitialized => None,
        }
    }

    /// Widen to the `i64` the instruction selector uses for immediates.
    ///
    /// # Panics
    ///
    /// Panics on `Uninitialized`; an uninitialised scalar never reaches an
    /// instruction operand.
    pub fn as_i64(self) -> i64 {
        match self {
            Scalar::I8(v) => v as i64,
            Scalar::I16(v) => v as i64,
            Scalar::I32(v) => v as i64,
            Scalar::I64(v) => v,
            Scalar::U8(v) => v as i64,
            Scalar::U16(v) => v as i64,
            Scalar::U32(v) => v as i64,
            Scalar::U64(v) => v as i64,
            Scalar::Bool(v) => v as i64,
            Scalar::Nil => 0,
            Scalar::Uninitialized => panic!("uninitialized scalar used as an immediate"),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::Bool => "bool",
            ScalarKind::Nil => "nil",
        };
        f.write_str(name)
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::I8(a), Scalar::I8(b)) => a == b,
            (Scalar::I16(a), Scalar::I16(b)) => a == b,
            (Scalar::I32(a), Scalar::I32(b)) => a == b,
            (Scalar::I64(a), Scalar::I64(b)) => a == b,
            (Scalar::U8(a), Scalar::U8(b)) => a == b,
            (Scalar::U16(a), Scalar::U16(b)) => a == b,
            (Scalar::U32(a), Scalar::U32(b)) => a == b,
            (Scalar::U64(a), Scalar::U64(b)) => a == b,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Nil, Scalar::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Nil => write!(f, "nil"),
            Scalar::Uninitialized => write!(f, "<uninit>"),
        }
    }
}
