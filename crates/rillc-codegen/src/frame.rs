//! Per-function stack frame accounting.

/// Tracks the stack space a function needs below `%rbp`.
///
/// `active_size` is the depth of the deepest live slot; `total_size` is the
/// high-water mark over the whole function and sizes the prologue's
/// `sub $n, %rsp`. The outgoing area at the bottom of the frame holds call
/// arguments beyond the register window and is addressed `%rsp`-relative.
#[derive(Clone, Copy, Debug, Default)]
pub struct StackFrame {
    active_size: i64,
    total_size: i64,
    outgoing_size: i64,
}

impl StackFrame {
    pub fn new() -> StackFrame {
        StackFrame::default()
    }

    /// Reserve a slot of `size`/`align` bytes, returning its `%rbp`-relative
    /// offset (negative).
    pub fn allocate(&mut self, size: u64, align: u64) -> i32 {
        debug_assert!(align.is_power_of_two());
        let size = size.max(1) as i64;
        let align = align as i64;
        self.active_size = round_up(self.active_size + size, align.max(1));
        self.total_size = self.total_size.max(self.active_size);
        let offset = -self.active_size;
        i32::try_from(offset).expect("stack frame exceeds 2 GiB")
    }

    /// Shrink the active depth after expired slots were swept. Only ever
    /// moves downward; the high-water mark is untouched.
    pub fn set_active(&mut self, depth: i64) {
        debug_assert!(depth <= self.active_size);
        debug_assert!(depth >= 0);
        self.active_size = depth;
    }

    /// Push the active depth down to the high-water mark, so the next slot
    /// lands below everything the function ever used. Serves the
    /// callee-saved save area, which must never be overlapped by a spill.
    pub fn set_active_to_total(&mut self) {
        self.active_size = self.total_size;
    }

    /// Grow the outgoing call-argument area to at least `bytes`.
    pub fn reserve_outgoing(&mut self, bytes: i64) {
        debug_assert!(bytes >= 0);
        self.outgoing_size = self.outgoing_size.max(bytes);
    }

    pub fn active_size(&self) -> i64 {
        self.active_size
    }

    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    /// True when the function touches the stack at all.
    pub fn uses_stack(&self) -> bool {
        self.total_size > 0 || self.outgoing_size > 0
    }

    /// Final frame size for the prologue: slots plus the outgoing area,
    /// rounded up to the ABI's 16-byte call-site alignment.
    pub fn frame_size(&self) -> i64 {
        round_up(self.total_size + self.outgoing_size, 16)
    }
}

fn round_up(value: i64, align: i64) -> i64 {
    debug_assert!(align > 0 && (align & (align - 1)) == 0);
    (value + align - 1) & !(align - 1)
}
