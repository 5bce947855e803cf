//! Copy and load intrinsics shared by the per-opcode lowerings.

mod copy;
mod load;
