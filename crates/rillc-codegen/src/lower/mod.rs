//! Instruction selection.
//!
//! [`select_function`] walks one function's IR and emits x86-64
//! instructions, consulting the [`Allocator`] to realise every operand.
//! Each opcode's lowering lives in its own submodule; the shared copy/load
//! intrinsics live in `crate::intrinsics`.
//!
//! Selection is the middle state of the per-function life cycle
//! Building -> Selected -> Emitted: the front end builds a [`Function`],
//! `select_function` consumes a view of it and returns a
//! [`SelectedFunction`] (IR closed, frame size final), and the emitter
//! consumes the `SelectedFunction`. The states cannot be re-entered.

mod add;
mod call;
mod div;
mod dot;
mod load;
mod mul;
mod neg;
mod ret;
mod sub;

use tracing::debug;

use rillc_ir::{Context, Function, Instruction, Lifetime, Operand, SsaId, TypeId};
use rillc_util::Symbol;

use crate::allocator::{Allocation, Allocator};
use crate::lifetimes::{self, Lifetimes};
use crate::x64::address::Address;
use crate::x64::gpr::{Gpr, ARGUMENT_GPRS};
use crate::x64::instruction::{OperandSize, X64Instruction};
use crate::x64::location::Location;
use crate::x64::operand::X64Operand;

/// A function after instruction selection: target instructions with the
/// prologue in place and the final frame size known.
#[derive(Debug)]
pub struct SelectedFunction {
    pub name: Symbol,
    pub code: Vec<X64Instruction>,
    pub frame_size: i64,
}

/// Lower `function` to x86-64.
pub fn select_function(context: &Context, function: &Function) -> SelectedFunction {
    debug!(function = %function.name, instructions = function.block.len(), "selecting");
    FunctionLowerer::new(context, function).select()
}

/// Two-operand arithmetic shapes that share one emission path.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ArithKind {
    Add,
    Sub,
}

pub(crate) struct FunctionLowerer<'ctx> {
    pub(crate) context: &'ctx Context,
    pub(crate) function: &'ctx Function,
    pub(crate) lifetimes: Lifetimes,
    pub(crate) allocator: Allocator,
    pub(crate) code: Vec<X64Instruction>,
}

impl<'ctx> FunctionLowerer<'ctx> {
    fn new(context: &'ctx Context, function: &'ctx Function) -> Self {
        let lifetimes = lifetimes::compute(function, context);
        let mut lowerer = FunctionLowerer {
            context,
            function,
            lifetimes,
            allocator: Allocator::new(function.ssa_count()),
            code: Vec::new(),
        };
        lowerer.allocate_incoming_arguments();
        lowerer
    }

    /// Place formal arguments where the System-V ABI delivers them: the
    /// first six scalars in the argument registers, the rest on the
    /// caller's stack above the return address.
    fn allocate_incoming_arguments(&mut self) {
        let function = self.function;
        for (index, argument) in function.args.iter().enumerate() {
            assert!(
                self.context.types.is_scalar(argument.ty),
                "composite argument passing is not implemented"
            );
            let lifetime = self.lifetimes[argument.ssa];
            if index < ARGUMENT_GPRS.len() {
                self.allocator.allocate_to_gpr(
                    argument.ssa,
                    argument.ty,
                    lifetime,
                    ARGUMENT_GPRS[index],
                    &self.context.types,
                    &mut self.code,
                );
            } else {
                // Return address and saved %rbp sit between %rbp and the
                // argument area.
                let offset = 16 + 8 * (index - ARGUMENT_GPRS.len()) as i32;
                self.allocator.allocate_to_address(
                    argument.ssa,
                    argument.ty,
                    lifetime,
                    Address::base_offset(Gpr::Rbp, offset),
                );
            }
        }
    }

    fn select(mut self) -> SelectedFunction {
        let function = self.function;
        for (index, instruction) in function.block.iter().enumerate() {
            let at = index as u32;
            self.allocator.release_expired(at);
            match *instruction {
                Instruction::Ret { value } => self.lower_ret(value, at),
                Instruction::Call { dst, callee, args } => self.lower_call(dst, callee, args, at),
                Instruction::Dot { dst, tuple, index } => self.lower_dot(dst, tuple, index, at),
                Instruction::Load { dst, src } => self.lower_load(dst, src, at),
                Instruction::Neg { dst, src } => self.lower_neg(dst, src, at),
                Instruction::Add { dst, lhs, rhs } => self.lower_add(dst, lhs, rhs, at),
                Instruction::Sub { dst, lhs, rhs } => self.lower_sub(dst, lhs, rhs, at),
                Instruction::Mul { dst, lhs, rhs } => self.lower_mul(dst, lhs, rhs, at),
                Instruction::Div { dst, lhs, rhs } => self.lower_div(dst, lhs, rhs, at),
                Instruction::Mod { dst, lhs, rhs } => self.lower_rem(dst, lhs, rhs, at),
            }
        }
        self.finalize()
    }

    /// Prepend the prologue now that the frame size is known, and wrap the
    /// epilogue with callee-saved restores.
    fn finalize(mut self) -> SelectedFunction {
        debug_assert!(
            matches!(self.code.last(), Some(X64Instruction::Ret)),
            "function body must end in ret"
        );

        let callee_saved = self.allocator.used_callee_saved();
        let mut saves = Vec::with_capacity(callee_saved.len());
        let mut restores = Vec::with_capacity(callee_saved.len());
        for gpr in callee_saved {
            let offset = self.allocator.allocate_callee_save_slot();
            let slot = X64Operand::Address(Address::base_offset(Gpr::Rbp, offset));
            saves.push(X64Instruction::Mov {
                size: OperandSize::Quad,
                dst: slot,
                src: X64Operand::Gpr(gpr),
            });
            restores.push(X64Instruction::Mov {
                size: OperandSize::Quad,
                dst: X64Operand::Gpr(gpr),
                src: slot,
            });
        }

        // The epilogue is the trailing `mov %rbp, %rsp; pop %rbp; ret`;
        // restores go right before it, while %rbp still frames the slots.
        let insert_at = self.code.len().saturating_sub(3);
        for (offset, restore) in restores.into_iter().enumerate() {
            self.code.insert(insert_at + offset, restore);
        }

        let frame_size = self.allocator.frame_size();
        let mut prologue = vec![
            X64Instruction::Push { src: X64Operand::Gpr(Gpr::Rbp) },
            X64Instruction::Mov {
                size: OperandSize::Quad,
                dst: X64Operand::Gpr(Gpr::Rbp),
                src: X64Operand::Gpr(Gpr::Rsp),
            },
        ];
        if frame_size > 0 {
            prologue.push(X64Instruction::Sub {
                size: OperandSize::Quad,
                dst: X64Operand::Gpr(Gpr::Rsp),
                src: X64Operand::Immediate(frame_size),
            });
        }
        prologue.extend(saves);
        self.code.splice(0..0, prologue);

        debug!(
            function = %self.function.name,
            frame_size,
            selected = self.code.len(),
            "selected"
        );
        SelectedFunction { name: self.function.name, code: self.code, frame_size }
    }

    // ----- shared helpers used by the per-opcode lowerings -----

    pub(crate) fn emit(&mut self, instruction: X64Instruction) {
        self.code.push(instruction);
    }

    pub(crate) fn local_type(&self, ssa: SsaId) -> TypeId {
        self.function.local(ssa).ty
    }

    pub(crate) fn lifetime_of(&self, ssa: SsaId) -> Lifetime {
        self.lifetimes[ssa]
    }

    /// True when `ssa`'s last use is exactly `at`.
    pub(crate) fn dies_at(&self, ssa: SsaId, at: u32) -> bool {
        self.lifetimes[ssa].last_use == at
    }

    pub(crate) fn operand_size(&self, ty: TypeId) -> OperandSize {
        OperandSize::from_bytes(self.context.types.size_of(ty))
    }

    pub(crate) fn allocate(&mut self, ssa: SsaId) -> Allocation {
        let ty = self.local_type(ssa);
        let lifetime = self.lifetime_of(ssa);
        self.allocator.allocate(ssa, ty, lifetime, &self.context.types, &mut self.code)
    }

    pub(crate) fn allocate_from_active(&mut self, ssa: SsaId, source: SsaId, at: u32) -> Allocation {
        let ty = self.local_type(ssa);
        let lifetime = self.lifetime_of(ssa);
        self.allocator.allocate_from_active(
            ssa,
            ty,
            lifetime,
            source,
            at,
            &self.context.types,
            &mut self.code,
        )
    }

    pub(crate) fn allocate_to_gpr(&mut self, ssa: SsaId, gpr: Gpr) -> Allocation {
        let ty = self.local_type(ssa);
        let lifetime = self.lifetime_of(ssa);
        self.allocator.allocate_to_gpr(ssa, ty, lifetime, gpr, &self.context.types, &mut self.code)
    }

    pub(crate) fn acquire_gpr(&mut self, gpr: Gpr) {
        self.allocator.acquire_gpr(gpr, &self.context.types, &mut self.code);
    }

    pub(crate) fn release_gpr(&mut self, gpr: Gpr) {
        self.allocator.release_gpr(gpr);
    }

    pub(crate) fn acquire_any_gpr(&mut self) -> Gpr {
        self.allocator.acquire_any_gpr(&self.context.types, &mut self.code)
    }

    pub(crate) fn reallocate_active(&mut self, ssa: SsaId) {
        self.allocator.reallocate_active(ssa, &self.context.types, &mut self.code);
    }

    /// Realise a scalar-valued operand as an x86-64 operand, without
    /// moving anything.
    pub(crate) fn scalar_operand(&mut self, operand: Operand) -> X64Operand {
        match operand {
            Operand::Ssa(ssa) => self.allocator.location_of(ssa).into(),
            Operand::Immediate(scalar) => X64Operand::Immediate(scalar.as_i64()),
            Operand::Constant(id) => {
                let constant = self.context.constants_at(id);
                match constant.value.as_scalar() {
                    Some(scalar) => X64Operand::Immediate(scalar.as_i64()),
                    None => panic!("tuple constant used as a scalar operand"),
                }
            }
            Operand::Label(label) => Address::from_label(label).into(),
        }
    }

    /// Emit `dst op= src`, inserting a scratch register when both sides
    /// would be memory operands.
    pub(crate) fn emit_arith(
        &mut self,
        kind: ArithKind,
        dst: Location,
        src: X64Operand,
        size: OperandSize,
    ) {
        let (src, scratch) = if dst.is_memory() && src.is_memory() {
            let scratch = self.acquire_any_gpr();
            self.emit(X64Instruction::Mov { size, dst: X64Operand::Gpr(scratch), src });
            (X64Operand::Gpr(scratch), Some(scratch))
        } else {
            (src, None)
        };
        let dst = dst.into();
        self.emit(match kind {
            ArithKind::Add => X64Instruction::Add { size, dst, src },
            ArithKind::Sub => X64Instruction::Sub { size, dst, src },
        });
        if let Some(scratch) = scratch {
            self.release_gpr(scratch);
        }
    }
}
