//! Linear-scan register allocation.
//!
//! The allocator owns the general-purpose register pool, the stack frame,
//! and one allocation record per SSA local. The instruction selector drives
//! it operation by operation while lowering: locals are placed when their
//! defining instruction is reached, registers can be commandeered for
//! instructions with fixed register operands, and expired locals are swept
//! before each instruction.
//!
//! The allocator never fails: when registers run out, the active local with
//! the greatest `last_use` is spilled to a fresh stack slot - the classic
//! linear-scan tie-break - and the stack frame simply grows.
//!
//! Every operation that can move a value appends the realising `mov` to the
//! instruction stream it is handed, so spill code lands exactly where the
//! placement decision was made.

mod allocation;
mod gprp;

pub use allocation::Allocation;
pub use gprp::GprPool;

use rillc_ir::{Lifetime, SsaId, TypeId, TypeInterner};
use rillc_util::IndexVec;

use crate::frame::StackFrame;
use crate::x64::address::{Address, AddressBase};
use crate::x64::gpr::Gpr;
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

/// Per-function allocation state.
pub struct Allocator {
    gprp: GprPool,
    frame: StackFrame,
    allocations: IndexVec<SsaId, Option<Allocation>>,
    /// Locals whose allocation is currently meaningful, in allocation
    /// order. The subset resident in GPRs mirrors the pool's occupants.
    live: Vec<SsaId>,
}

impl Allocator {
    pub fn new(ssa_count: usize) -> Allocator {
        Allocator {
            gprp: GprPool::new(),
            frame: StackFrame::new(),
            allocations: IndexVec::from_elem(None, ssa_count),
            live: Vec::new(),
        }
    }

    /// The allocation of `ssa`.
    ///
    /// # Panics
    ///
    /// Panics when `ssa` has not been allocated; that is a selector bug.
    pub fn allocation_of(&self, ssa: SsaId) -> Allocation {
        self.allocations[ssa].unwrap_or_else(|| panic!("{ssa:?} has no allocation"))
    }

    /// Current location of `ssa`. Always re-fetch after any operation that
    /// may move values; allocations are updated in place.
    pub fn location_of(&self, ssa: SsaId) -> Location {
        self.allocation_of(ssa).location
    }

    pub fn frame(&self) -> &StackFrame {
        &self.frame
    }

    pub fn uses_stack(&self) -> bool {
        self.frame.uses_stack()
    }

    /// Final frame size, 16-byte aligned.
    pub fn frame_size(&self) -> i64 {
        self.frame.frame_size()
    }

    /// Grow the outgoing call-argument area to at least `bytes`.
    pub fn reserve_outgoing(&mut self, bytes: i64) {
        self.frame.reserve_outgoing(bytes);
    }

    /// Callee-saved registers the function ever allocated.
    pub fn used_callee_saved(&self) -> Vec<Gpr> {
        self.gprp.used_callee_saved()
    }

    /// Reserve a save slot for one callee-saved register. Placed below the
    /// frame's high-water mark so no spill ever overlaps it.
    pub fn allocate_callee_save_slot(&mut self) -> i32 {
        self.frame.set_active_to_total();
        self.frame.allocate(8, 8)
    }

    /// Allocate `ssa` per linear scan: composites get a stack slot sized by
    /// their layout; scalars prefer a free GPR and otherwise steal the
    /// register of the active local expiring last.
    pub fn allocate(
        &mut self,
        ssa: SsaId,
        ty: TypeId,
        lifetime: Lifetime,
        types: &TypeInterner,
        code: &mut Vec<X64Instruction>,
    ) -> Allocation {
        let location = if types.is_scalar(ty) {
            match self.gprp.next_available() {
                Some(gpr) => {
                    self.gprp.set_occupant(gpr, Some(ssa));
                    Location::Gpr(gpr)
                }
                None => {
                    let victim = self.spill_victim();
                    let gpr = self.spill(victim, types, code);
                    let acquired = self.gprp.acquire(gpr);
                    debug_assert!(acquired);
                    self.gprp.set_occupant(gpr, Some(ssa));
                    Location::Gpr(gpr)
                }
            }
        } else {
            let size = types.size_of(ty);
            let align = types.align_of(ty);
            Location::stack(self.frame.allocate(size, align))
        };
        self.record(ssa, ty, lifetime, location)
    }

    /// Allocate `ssa`, initialised from the active local `source`. When the
    /// source dies at `at` its location is reused in place and no copy is
    /// needed; otherwise a fresh location is chosen and the caller emits
    /// the copy.
    pub fn allocate_from_active(
        &mut self,
        ssa: SsaId,
        ty: TypeId,
        lifetime: Lifetime,
        source: SsaId,
        at: u32,
        types: &TypeInterner,
        code: &mut Vec<X64Instruction>,
    ) -> Allocation {
        let source_allocation = self.allocation_of(source);
        if source_allocation.lifetime.last_use == at {
            self.live.retain(|&live| live != source);
            let location = source_allocation.location;
            if let Location::Gpr(gpr) = location {
                self.gprp.set_occupant(gpr, Some(ssa));
            }
            return self.record(ssa, ty, lifetime, location);
        }
        self.allocate(ssa, ty, lifetime, types, code)
    }

    /// Force `ssa` into `gpr`, relocating or spilling the current occupant.
    pub fn allocate_to_gpr(
        &mut self,
        ssa: SsaId,
        ty: TypeId,
        lifetime: Lifetime,
        gpr: Gpr,
        types: &TypeInterner,
        code: &mut Vec<X64Instruction>,
    ) -> Allocation {
        self.evict(gpr, types, code);
        let acquired = self.gprp.acquire(gpr);
        debug_assert!(acquired, "evict left {gpr:?} in use");
        self.gprp.set_occupant(gpr, Some(ssa));
        self.record(ssa, ty, lifetime, Location::Gpr(gpr))
    }

    /// Pin `ssa` to an explicit memory location. Used for incoming stack
    /// arguments; the caller vouches for the address.
    pub fn allocate_to_address(
        &mut self,
        ssa: SsaId,
        ty: TypeId,
        lifetime: Lifetime,
        address: Address,
    ) -> Allocation {
        self.record(ssa, ty, lifetime, Location::Address(address))
    }

    /// Take `gpr` for a scratch purpose, relocating or spilling any live
    /// occupant. Balance with [`Allocator::release_gpr`].
    pub fn acquire_gpr(&mut self, gpr: Gpr, types: &TypeInterner, code: &mut Vec<X64Instruction>) {
        self.evict(gpr, types, code);
        let acquired = self.gprp.acquire(gpr);
        debug_assert!(acquired, "scratch acquire of {gpr:?} twice");
    }

    /// Return a scratch-held register. Does nothing when `gpr` is free or
    /// holds an allocation.
    pub fn release_gpr(&mut self, gpr: Gpr) {
        if self.gprp.is_used(gpr) && self.gprp.occupant(gpr).is_none() {
            self.gprp.release(gpr);
        }
    }

    /// Take an arbitrary free register for a scratch purpose, spilling if
    /// none is free.
    pub fn acquire_any_gpr(&mut self, types: &TypeInterner, code: &mut Vec<X64Instruction>) -> Gpr {
        if let Some(gpr) = self.gprp.next_available() {
            return gpr;
        }
        let victim = self.spill_victim();
        let gpr = self.spill(victim, types, code);
        let acquired = self.gprp.acquire(gpr);
        debug_assert!(acquired);
        gpr
    }

    /// Move a still-live register-resident local somewhere else, preferring
    /// another free register, spilling as a last resort. No-op for locals
    /// already in memory.
    pub fn reallocate_active(
        &mut self,
        ssa: SsaId,
        types: &TypeInterner,
        code: &mut Vec<X64Instruction>,
    ) {
        let allocation = self.allocation_of(ssa);
        let Location::Gpr(old) = allocation.location else {
            return;
        };
        match self.gprp.next_available() {
            Some(new) => {
                let size = OperandSize::from_bytes(types.size_of(allocation.ty));
                code.push(X64Instruction::Mov {
                    size,
                    dst: X64Operand::Gpr(new),
                    src: X64Operand::Gpr(old),
                });
                self.gprp.set_occupant(new, Some(ssa));
                self.gprp.release(old);
                self.set_location(ssa, Location::Gpr(new));
            }
            None => {
                self.spill(ssa, types, code);
            }
        }
    }

    /// Sweep the active set, releasing every local whose lifetime ended
    /// strictly before `at`.
    pub fn release_expired(&mut self, at: u32) {
        let allocations = &self.allocations;
        let gprp = &mut self.gprp;
        self.live.retain(|&ssa| {
            let allocation = allocations[ssa].expect("live local without allocation");
            if allocation.lifetime.expired_at(at) {
                if let Location::Gpr(gpr) = allocation.location {
                    gprp.release(gpr);
                }
                false
            } else {
                true
            }
        });

        // Shrink the active frame depth to the deepest still-live slot so a
        // dead tail can be reused.
        let mut depth = 0i64;
        for &ssa in &self.live {
            if let Location::Address(address) = self.allocations[ssa].unwrap().location {
                if address.base == AddressBase::Gpr(Gpr::Rbp) && address.offset < 0 {
                    depth = depth.max(-i64::from(address.offset));
                }
            }
        }
        self.frame.set_active(depth);
    }

    /// Spill every live caller-saved register resident local that survives
    /// past `at`. Run before a `call`; callee-saved residents are safe.
    pub fn spill_live_caller_saved(
        &mut self,
        at: u32,
        types: &TypeInterner,
        code: &mut Vec<X64Instruction>,
    ) {
        for index in 0..16 {
            let gpr = Gpr::from_index(index);
            if gpr.is_callee_saved() {
                continue;
            }
            if let Some(ssa) = self.gprp.occupant(gpr) {
                // A value whose last use is this very call is already
                // consumed; only values alive afterwards need saving.
                if self.allocation_of(ssa).alive_at(at + 1) {
                    self.spill(ssa, types, code);
                }
            }
        }
    }

    /// Number of live locals holding a GPR. Exposed for tests.
    pub fn active_register_count(&self) -> usize {
        self.live
            .iter()
            .filter(|&&ssa| matches!(self.allocations[ssa].unwrap().location, Location::Gpr(_)))
            .count()
    }

    /// Locations of all live locals. Exposed for tests and invariant
    /// checks: no two live locals may share a location.
    pub fn live_locations(&self) -> Vec<(SsaId, Location)> {
        self.live
            .iter()
            .map(|&ssa| (ssa, self.allocations[ssa].unwrap().location))
            .collect()
    }

    fn record(&mut self, ssa: SsaId, ty: TypeId, lifetime: Lifetime, location: Location) -> Allocation {
        let allocation = Allocation { ssa, lifetime, location, ty };
        self.allocations[ssa] = Some(allocation);
        self.live.push(ssa);
        allocation
    }

    fn set_location(&mut self, ssa: SsaId, location: Location) {
        let allocation = self.allocations[ssa].as_mut().expect("relocating unallocated local");
        allocation.location = location;
    }

    /// The register-resident live local expiring last. Ties break towards
    /// the lowest SSA id, deterministically.
    fn spill_victim(&self) -> SsaId {
        let mut victim: Option<(SsaId, u32)> = None;
        for index in 0..16 {
            let gpr = Gpr::from_index(index);
            if let Some(ssa) = self.gprp.occupant(gpr) {
                let last_use = self.allocation_of(ssa).lifetime.last_use;
                let better = match victim {
                    None => true,
                    Some((victim_ssa, victim_last)) => {
                        last_use > victim_last || (last_use == victim_last && ssa < victim_ssa)
                    }
                };
                if better {
                    victim = Some((ssa, last_use));
                }
            }
        }
        victim.expect("register pressure with no spillable occupant").0
    }

    /// Move `ssa` from its register to a fresh stack slot, emitting the
    /// store. Returns the freed register.
    fn spill(&mut self, ssa: SsaId, types: &TypeInterner, code: &mut Vec<X64Instruction>) -> Gpr {
        let allocation = self.allocation_of(ssa);
        let Location::Gpr(gpr) = allocation.location else {
            panic!("spill of memory-resident {ssa:?}")
        };
        let size = types.size_of(allocation.ty);
        let offset = self.frame.allocate(size, types.align_of(allocation.ty));
        code.push(X64Instruction::Mov {
            size: OperandSize::from_bytes(size),
            dst: X64Operand::Address(Address::base_offset(Gpr::Rbp, offset)),
            src: X64Operand::Gpr(gpr),
        });
        self.gprp.release(gpr);
        self.set_location(ssa, Location::stack(offset));
        gpr
    }

    /// Make `gpr` free: relocate a live occupant to another register when
    /// one is free, spill it otherwise.
    fn evict(&mut self, gpr: Gpr, types: &TypeInterner, code: &mut Vec<X64Instruction>) {
        if !self.gprp.is_used(gpr) {
            return;
        }
        let occupant = self
            .gprp
            .occupant(gpr)
            .unwrap_or_else(|| panic!("evicting scratch-held {gpr:?}"));
        self.reallocate_active(occupant, types, code);
        debug_assert!(!self.gprp.is_used(gpr));
    }
}
