//! Module-scope compilation context.
//!
//! One [`Context`] aggregates every module-level table: the type interner,
//! the append-only constant pool, the append-only label table, and the
//! symbol table. The front end fills it; the code generator reads it.
//! Symbol iteration follows insertion order, which is what makes whole-
//! module emission deterministic.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use rillc_util::{IndexVec, Symbol};

use crate::function::Function;
use crate::operand::Operand;
use crate::types::TypeInterner;
use crate::value::Value;
use crate::{ConstId, LabelId, TypeId};

/// A constant-pool entry. The type is recorded at append time so later
/// passes can classify operands without re-deriving tuple types.
#[derive(Clone, Debug)]
pub struct Constant {
    pub value: Value,
    pub ty: TypeId,
}

/// What a global symbol is bound to.
#[derive(Debug)]
pub enum SymbolKind {
    /// Global data, emitted to `.data`/`.bss`.
    Data(Value),
    /// A compiled function.
    Code(Function),
}

/// A module-scope symbol.
#[derive(Debug)]
pub struct SymbolEntry {
    pub name: Symbol,
    pub ty: TypeId,
    pub kind: SymbolKind,
}

/// Module-scope tables, exclusively owned by one compilation.
#[derive(Debug)]
pub struct Context {
    pub types: TypeInterner,
    constants: IndexVec<ConstId, Constant>,
    labels: IndexVec<LabelId, Symbol>,
    label_ids: FxHashMap<Symbol, LabelId>,
    symbols: IndexMap<Symbol, SymbolEntry>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            types: TypeInterner::new(),
            constants: IndexVec::new(),
            labels: IndexVec::new(),
            label_ids: FxHashMap::default(),
            symbols: IndexMap::new(),
        }
    }

    /// Append a value to the constant pool. Constants are not deduplicated.
    pub fn constants_append(&mut self, value: Value, ty: TypeId) -> ConstId {
        self.constants.push(Constant { value, ty })
    }

    pub fn constants_at(&self, id: ConstId) -> &Constant {
        &self.constants[id]
    }

    /// Intern a global symbol name into the label table, returning its
    /// stable handle. The same name always maps to the same handle.
    pub fn labels_insert(&mut self, name: Symbol) -> LabelId {
        if let Some(&id) = self.label_ids.get(&name) {
            return id;
        }
        let id = self.labels.push(name);
        self.label_ids.insert(name, id);
        id
    }

    pub fn labels_at(&self, id: LabelId) -> Symbol {
        self.labels[id]
    }

    /// The label handle of `name`, if one was interned.
    pub fn label_of(&self, name: Symbol) -> Option<LabelId> {
        self.label_ids.get(&name).copied()
    }

    /// Bind `name` to a compiled function.
    ///
    /// # Panics
    ///
    /// Panics on redefinition; the front end rejects duplicates first.
    pub fn define_function(&mut self, name: Symbol, ty: TypeId, function: Function) {
        let previous = self
            .symbols
            .insert(name, SymbolEntry { name, ty, kind: SymbolKind::Code(function) });
        assert!(previous.is_none(), "symbol {name} defined twice");
    }

    /// Bind `name` to global data.
    pub fn define_data(&mut self, name: Symbol, ty: TypeId, value: Value) {
        let previous = self
            .symbols
            .insert(name, SymbolEntry { name, ty, kind: SymbolKind::Data(value) });
        assert!(previous.is_none(), "symbol {name} defined twice");
    }

    pub fn symbol(&self, name: Symbol) -> Option<&SymbolEntry> {
        self.symbols.get(&name)
    }

    /// Symbols in definition order.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.symbols.values()
    }

    /// The type of an operand as seen from inside `function`.
    pub fn operand_type(&self, function: &Function, operand: Operand) -> TypeId {
        match operand {
            Operand::Ssa(ssa) => function.local(ssa).ty,
            Operand::Immediate(scalar) => {
                let kind = scalar
                    .kind()
                    .expect("uninitialized scalar has no operand type");
                self.types.scalar(kind)
            }
            Operand::Constant(id) => self.constants_at(id).ty,
            Operand::Label(id) => {
                let name = self.labels_at(id);
                self.symbol(name)
                    .unwrap_or_else(|| panic!("label {name} has no symbol"))
                    .ty
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
