//! Global string table behind [`Symbol`].
//!
//! The table is shared by the whole process and never shrinks: interned
//! strings are leaked to obtain `'static` references, which is safe because
//! the table lives as long as the compiler does and entries are never
//! removed. `DashMap` keeps interning lock-free from concurrent tests; the
//! compilation pipeline itself is single-threaded.
//!
//! Lookup is a hash of the string (AHasher) into a map of
//! `hash -> (text, index)`; collisions are resolved by probing with a
//! golden-ratio offset. A reverse map `index -> text` makes
//! [`StringTable::resolve`] O(1), which matters because the assembly
//! emitter resolves every label it prints.

use ahash::AHasher;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use super::Symbol;

/// Strings pre-interned at table construction, in `Symbol` index order.
/// Must match the `KW_*`/`TY_*`/`SYM_*` constants in `mod.rs`.
const KNOWN_SYMBOLS: &[&str] = &[
    "fn", "const", "return", "nil", "true", "false", "i32", "bool", "main",
];

/// The global string table, initialised on first use.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    for symbol in KNOWN_SYMBOLS {
        table.intern(symbol);
    }
    table
});

/// Thread-safe interner storage.
pub struct StringTable {
    /// `hash -> (text, index)`; the hash key avoids string comparison on
    /// the common no-collision path.
    map: DashMap<u64, (&'static str, u32)>,

    /// `index -> text`, for O(1) symbol resolution.
    strings: DashMap<u32, &'static str>,

    /// Next index to hand out.
    next_index: AtomicU32,
}

const MAX_PROBES: u64 = 32;
const PROBE_OFFSET: u64 = 0x9e3779b97f4a7c15;

impl StringTable {
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity(256),
            strings: DashMap::with_capacity(256),
            next_index: AtomicU32::new(0),
        }
    }

    /// Intern `string`, returning the existing symbol on a hit.
    pub fn intern(&self, string: &str) -> Symbol {
        let hash = Self::hash_string(string);

        // Fast path: already interned under its natural hash slot. The read
        // guard must drop before any `entry` call below touches the map.
        let hit = self
            .map
            .get(&hash)
            .and_then(|entry| (entry.value().0 == string).then_some(entry.value().1));
        if let Some(index) = hit {
            return Symbol { index };
        }

        match self.map.entry(hash) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                if entry.get().0 == string {
                    Symbol { index: entry.get().1 }
                } else {
                    drop(entry);
                    self.intern_probed(string, hash)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let (text, index) = self.allocate(string);
                entry.insert((text, index));
                Symbol { index }
            }
        }
    }

    /// Collision path: probe with a golden-ratio offset until the string is
    /// found or an empty slot appears.
    fn intern_probed(&self, string: &str, original_hash: u64) -> Symbol {
        for i in 1..=MAX_PROBES {
            let probe_hash = original_hash.wrapping_add(i.wrapping_mul(PROBE_OFFSET));
            match self.map.entry(probe_hash) {
                dashmap::mapref::entry::Entry::Occupied(entry) => {
                    if entry.get().0 == string {
                        return Symbol { index: entry.get().1 };
                    }
                }
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    let (text, index) = self.allocate(string);
                    entry.insert((text, index));
                    return Symbol { index };
                }
            }
        }
        panic!("string interner exceeded {MAX_PROBES} probes for {string:?}");
    }

    fn allocate(&self, string: &str) -> (&'static str, u32) {
        let text: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.strings.insert(index, text);
        (text, index)
    }

    /// Resolve a symbol back to its text.
    ///
    /// # Panics
    ///
    /// Panics on a symbol that was not produced by this table.
    pub fn resolve(&self, symbol: Symbol) -> &'static str {
        *self
            .strings
            .get(&symbol.index)
            .unwrap_or_else(|| panic!("unknown symbol index {}", symbol.index))
            .value()
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True when nothing has been interned (never the case once the known
    /// symbols are in).
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    fn hash_string(string: &str) -> u64 {
        let mut hasher = AHasher::default();
        string.hash(&mut hasher);
        hasher.finish()
    }
}
