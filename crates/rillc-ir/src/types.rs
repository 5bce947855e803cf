//! Types, the type interner, and layout queries.
//!
//! Types are hash-consed: structurally equal types share one [`TypeId`], so
//! every later comparison is an index comparison. Scalar types are interned
//! at construction, which keeps the common `scalar()` lookup `&self` while
//! tuple and function interning (front-end-only operations) take `&mut`.

use rustc_hash::FxHashMap;

use rillc_util::IndexVec;

use crate::scalar::ScalarKind;
use crate::TypeId;

/// A rill type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(ScalarKind),
    Tuple(Vec<TypeId>),
    Function { ret: TypeId, args: Vec<TypeId> },
}

/// Byte layout of one tuple type: C-like, fields in declaration order, each
/// padded to its own alignment, the whole rounded up to the max field
/// alignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleLayout {
    /// `(field type, byte offset)` in declaration order.
    pub fields: Vec<(TypeId, u64)>,
    /// Total size including trailing padding.
    pub size: u64,
    /// Max alignment over the fields (1 for the empty tuple).
    pub align: u64,
}

/// Hash-consing interner for [`Type`].
#[derive(Debug)]
pub struct TypeInterner {
    types: IndexVec<TypeId, Type>,
    lookup: FxHashMap<Type, TypeId>,
    scalars: [TypeId; ScalarKind::ALL.len()],
}

impl TypeInterner {
    /// Create an interner with every scalar kind pre-interned.
    pub fn new() -> Self {
        let mut interner = TypeInterner {
            types: IndexVec::new(),
            lookup: FxHashMap::default(),
            scalars: [TypeId(0); ScalarKind::ALL.len()],
        };
        for kind in ScalarKind::ALL {
            let id = interner.intern(Type::Scalar(kind));
            interner.scalars[kind.ordinal()] = id;
        }
        interner
    }

    fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.lookup.get(&ty) {
            return id;
        }
        let id = self.types.push(ty.clone());
        self.lookup.insert(ty, id);
        id
    }

    /// The handle of a scalar type. Pure lookup.
    pub fn scalar(&self, kind: ScalarKind) -> TypeId {
        self.scalars[kind.ordinal()]
    }

    /// Intern a tuple type. Idempotent in the field sequence.
    pub fn intern_tuple(&mut self, fields: Vec<TypeId>) -> TypeId {
        self.intern(Type::Tuple(fields))
    }

    /// Intern a function type. Idempotent in `(ret, args)`.
    pub fn intern_function(&mut self, ret: TypeId, args: Vec<TypeId>) -> TypeId {
        self.intern(Type::Function { ret, args })
    }

    /// Resolve a handle.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    /// True when `id` names a scalar type.
    pub fn is_scalar(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Scalar(_))
    }

    /// Size of a value of this type, in bytes.
    ///
    /// Function types size as a code address.
    pub fn size_of(&self, id: TypeId) -> u64 {
        match self.get(id) {
            Type::Scalar(kind) => kind.size(),
            Type::Tuple(_) => self.tuple_layout(id).size,
            Type::Function { .. } => 8,
        }
    }

    /// Alignment of a value of this type, in bytes.
    pub fn align_of(&self, id: TypeId) -> u64 {
        match self.get(id) {
            Type::Scalar(kind) => kind.align(),
            Type::Tuple(fields) => {
                fields.iter().map(|&f| self.align_of(f)).max().unwrap_or(1)
            }
            Type::Function { .. } => 8,
        }
    }

    /// Compute the byte layout of a tuple type.
    ///
    /// # Panics
    ///
    /// Panics when `id` is not a tuple type.
    pub fn tuple_layout(&self, id: TypeId) -> TupleLayout {
        let Type::Tuple(field_types) = self.get(id) else {
            panic!("tuple_layout on non-tuple type {id:?}");
        };
        let mut fields = Vec::with_capacity(field_types.len());
        let mut offset = 0u64;
        let mut align = 1u64;
        for &field in field_types {
            let field_align = self.align_of(field);
            offset = round_up(offset, field_align);
            fields.push((field, offset));
            offset += self.size_of(field);
            align = align.max(field_align);
        }
        TupleLayout { fields, size: round_up(offset, align), align }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

fn round_up(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}
