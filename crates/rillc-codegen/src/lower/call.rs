//! `CALL dst, callee, args` - System-V AMD64 calls.
//!
//! The first six scalar arguments travel in `rdi, rsi, rdx, rcx, r8, r9`;
//! the rest are stored to the outgoing area at the bottom of the frame, in
//! declaration order. Live caller-saved registers are spilled before the
//! call; the scalar result comes back in `%rax`.

use rillc_ir::{Operand, SsaId};

use super::FunctionLowerer;
use crate::x64::address::Address;
use crate::x64::gpr::{Gpr, ARGUMENT_GPRS};
use crate::x64::instruction::X64Instruction;
use crate::x64::operand::X64Operand;

impl FunctionLowerer<'_> {
    pub(super) fn lower_call(&mut self, dst: SsaId, callee: Operand, args: Operand, at: u32) {
        let Operand::Label(label) = callee else {
            panic!("call target is not a label")
        };
        let Operand::Constant(args_id) = args else {
            panic!("call arguments are not a tuple constant")
        };
        let arguments = self
            .context
            .constants_at(args_id)
            .value
            .as_tuple()
            .expect("call arguments are not a tuple")
            .elements
            .clone();

        let register_args = arguments.len().min(ARGUMENT_GPRS.len());
        let stack_args = arguments.len() - register_args;
        if stack_args > 0 {
            self.allocator.reserve_outgoing(8 * stack_args as i64);
        }

        // Fence every argument register up front so no argument source is
        // sitting in one when the values are moved in.
        for &gpr in &ARGUMENT_GPRS[..register_args] {
            self.acquire_gpr(gpr);
        }
        for (index, &argument) in arguments.iter().take(register_args).enumerate() {
            self.load_gpr_from_operand(ARGUMENT_GPRS[index], argument, at);
        }
        for (index, &argument) in arguments.iter().enumerate().skip(register_args) {
            let slot = Address::base_offset(Gpr::Rsp, (8 * (index - register_args)) as i32);
            let ty = self.context.operand_type(self.function, argument);
            assert!(self.context.types.is_scalar(ty), "composite call arguments are not implemented");
            self.load_address_from_operand(slot, argument, ty, at);
        }

        self.allocator.spill_live_caller_saved(at, &self.context.types, &mut self.code);
        self.emit(X64Instruction::Call { target: X64Operand::Label(label) });

        for &gpr in &ARGUMENT_GPRS[..register_args] {
            self.release_gpr(gpr);
        }
        // Everything consumed by the call is dead from here on; sweeping
        // now frees %rax for the result without a pointless relocation.
        self.allocator.release_expired(at + 1);

        let result_ty = self.local_type(dst);
        if !self.context.types.is_scalar(result_ty) {
            panic!("composite return values are not implemented");
        }
        self.allocate_to_gpr(dst, Gpr::Rax);
    }
}
