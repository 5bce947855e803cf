//! The general-purpose register pool.

use rillc_ir::SsaId;
use rillc_util::Bitset16;

use crate::x64::gpr::{Gpr, ALLOCATION_ORDER};

/// Tracks which GPRs are in use, which SSA local occupies each, and which
/// callee-saved registers the function has touched (the prologue must save
/// exactly that set).
///
/// A register can be *used* with no occupant: that is a scratch hold taken
/// with `acquire`, e.g. `%rdx` around a division.
#[derive(Debug)]
pub struct GprPool {
    used: Bitset16,
    occupants: [Option<SsaId>; 16],
    callee_saved_used: Bitset16,
}

impl GprPool {
    pub fn new() -> GprPool {
        GprPool {
            used: Bitset16::new(),
            occupants: [None; 16],
            callee_saved_used: Bitset16::new(),
        }
    }

    pub fn is_used(&self, gpr: Gpr) -> bool {
        self.used.get(gpr.index())
    }

    pub fn occupant(&self, gpr: Gpr) -> Option<SsaId> {
        self.occupants[gpr.index() as usize]
    }

    /// Mark `gpr` used. Returns false when it already was.
    pub fn acquire(&mut self, gpr: Gpr) -> bool {
        if self.is_used(gpr) {
            return false;
        }
        self.used.set(gpr.index());
        if gpr.is_callee_saved() {
            self.callee_saved_used.set(gpr.index());
        }
        true
    }

    /// Free `gpr` and forget its occupant.
    pub fn release(&mut self, gpr: Gpr) {
        self.used.clear(gpr.index());
        self.occupants[gpr.index() as usize] = None;
    }

    /// Record which local holds `gpr`. The register must be used.
    pub fn set_occupant(&mut self, gpr: Gpr, ssa: Option<SsaId>) {
        debug_assert!(self.is_used(gpr));
        self.occupants[gpr.index() as usize] = ssa;
    }

    /// Claim the first free register in scratch-preferred order.
    pub fn next_available(&mut self) -> Option<Gpr> {
        for &gpr in &ALLOCATION_ORDER {
            if !self.is_used(gpr) {
                self.acquire(gpr);
                return Some(gpr);
            }
        }
        None
    }

    /// Callee-saved registers this function has ever allocated, in
    /// register-index order.
    pub fn used_callee_saved(&self) -> Vec<Gpr> {
        self.callee_saved_used.iter().map(Gpr::from_index).collect()
    }
}

impl Default for GprPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_cycle() {
        let mut pool = GprPool::new();
        assert!(pool.acquire(Gpr::Rcx));
        assert!(!pool.acquire(Gpr::Rcx));
        pool.release(Gpr::Rcx);
        assert!(pool.acquire(Gpr::Rcx));
    }

    #[test]
    fn next_available_follows_preference_order() {
        let mut pool = GprPool::new();
        assert_eq!(pool.next_available(), Some(Gpr::R10));
        assert_eq!(pool.next_available(), Some(Gpr::R11));
        assert_eq!(pool.next_available(), Some(Gpr::Rcx));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut pool = GprPool::new();
        for _ in 0..ALLOCATION_ORDER.len() {
            assert!(pool.next_available().is_some());
        }
        assert_eq!(pool.next_available(), None);
    }

    #[test]
    fn callee_saved_usage_is_tracked() {
        let mut pool = GprPool::new();
        pool.acquire(Gpr::Rbx);
        pool.acquire(Gpr::R10);
        assert_eq!(pool.used_callee_saved(), vec![Gpr::Rbx]);
    }

    #[test]
    fn occupants_are_per_register() {
        let mut pool = GprPool::new();
        pool.acquire(Gpr::R8);
        pool.set_occupant(Gpr::R8, Some(SsaId(3)));
        assert_eq!(pool.occupant(Gpr::R8), Some(SsaId(3)));
        pool.release(Gpr::R8);
        assert_eq!(pool.occupant(Gpr::R8), None);
    }
}
