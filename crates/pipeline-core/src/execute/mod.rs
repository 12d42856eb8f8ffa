//! Execution-effect applier.
//!
//! Effects are computed from a read-only view of the state first and applied
//! afterwards, so a faulting instruction never mutates anything.

/// Memory-reference resolution.
pub(crate) mod address;

use std::fmt;

use crate::memory::{resolve_index, AccessPolicy};
use crate::operator::Operator;
use crate::program::{Instruction, Operand};
use crate::state::{ArchitecturalState, Register};
use crate::SimError;

use address::{load_operand, store_address};

/// Architectural change made by one instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Effect {
    /// Integer register write.
    IntRegister {
        /// Destination register.
        reg: Register,
        /// Value written.
        value: i32,
    },
    /// Floating-point register write.
    FpRegister {
        /// Destination register.
        reg: Register,
        /// Value written.
        value: f32,
    },
    /// Memory word write.
    Memory {
        /// In-range word address.
        address: i64,
        /// Value written.
        value: i32,
    },
    /// Lenient store outside memory; nothing written.
    Discarded {
        /// Out-of-range word address.
        address: i64,
    },
}

impl Effect {
    fn apply_to(self, state: &mut ArchitecturalState) -> Result<(), SimError> {
        match self {
            Self::IntRegister { reg, value } => state.set_int(reg, value),
            Self::FpRegister { reg, value } => state.set_fp(reg, value),
            Self::Memory { address, value } => {
                state.write_word(address, value)?;
            }
            Self::Discarded { .. } => {}
        }
        Ok(())
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntRegister { reg, value } => write!(f, "${reg} <- {value}"),
            Self::FpRegister { reg, value } => write!(f, "F{reg} <- {value:?}"),
            Self::Memory { address, value } => write!(f, "memory[{address}] <- {value}"),
            Self::Discarded { address } => write!(f, "store to {address} discarded"),
        }
    }
}

/// Rounds half up (`floor(x + 0.5)`), saturating to `i32`; NaN becomes 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f32) -> i32 {
    (f64::from(value) + 0.5).floor() as i32
}

#[allow(clippy::cast_precision_loss)]
fn word_to_fp(word: i32) -> f32 {
    word as f32
}

/// Computes the effect of `instruction` without touching `state`.
///
/// # Errors
///
/// - [`SimError::Configuration`] for branch-class operators.
/// - [`SimError::MemoryOutOfRange`] for strict accesses outside memory.
/// - [`SimError::MalformedOperands`] when the operands do not fit the operator.
pub fn plan_effect(
    instruction: &Instruction,
    state: &ArchitecturalState,
    policy: AccessPolicy,
) -> Result<Effect, SimError> {
    let operator = instruction.operator();
    if operator.is_branch() {
        return Err(SimError::Configuration { operator });
    }

    let effect = match (operator, instruction.operands()) {
        (Operator::LoadFp, [Operand::FpRegister(reg), Operand::Address(reference)]) => {
            let loaded = load_operand(*reference, state, policy)?;
            Effect::FpRegister {
                reg: *reg,
                value: word_to_fp(loaded.bias) + word_to_fp(loaded.word),
            }
        }
        (Operator::LoadWord, [Operand::IntRegister(reg), Operand::Address(reference)]) => {
            let loaded = load_operand(*reference, state, policy)?;
            Effect::IntRegister {
                reg: *reg,
                value: loaded.bias.wrapping_add(loaded.word),
            }
        }
        (Operator::StoreFp, [Operand::FpRegister(reg), Operand::Address(reference)]) => {
            let value = round_half_up(state.fp(*reg));
            store(state, store_address(*reference, state), value, policy)?
        }
        (Operator::StoreWord, [Operand::IntRegister(reg), Operand::Address(reference)]) => {
            store(state, store_address(*reference, state), state.int(*reg), policy)?
        }
        (Operator::LoadImmediate, [Operand::IntRegister(reg), Operand::Immediate(value)]) => {
            Effect::IntRegister {
                reg: *reg,
                value: *value,
            }
        }
        (
            Operator::AddImmediate,
            [Operand::IntRegister(reg), Operand::IntRegister(lhs), Operand::Immediate(imm)],
        ) => Effect::IntRegister {
            reg: *reg,
            value: state.int(*lhs).wrapping_add(*imm),
        },
        (
            Operator::Add | Operator::Subtract,
            [Operand::IntRegister(reg), Operand::IntRegister(lhs), Operand::IntRegister(rhs)],
        ) => {
            let (lhs, rhs) = (state.int(*lhs), state.int(*rhs));
            let value = if operator == Operator::Add {
                lhs.wrapping_add(rhs)
            } else {
                lhs.wrapping_sub(rhs)
            };
            Effect::IntRegister { reg: *reg, value }
        }
        (
            Operator::FpAdd | Operator::FpSubtract | Operator::FpMultiply | Operator::FpDivide,
            [Operand::FpRegister(reg), Operand::FpRegister(lhs), Operand::FpRegister(rhs)],
        ) => {
            let (lhs, rhs) = (state.fp(*lhs), state.fp(*rhs));
            let value = match operator {
                Operator::FpAdd => lhs + rhs,
                Operator::FpSubtract => lhs - rhs,
                Operator::FpMultiply => lhs * rhs,
                _ => lhs / rhs,
            };
            Effect::FpRegister { reg: *reg, value }
        }
        _ => return Err(SimError::MalformedOperands { operator }),
    };

    Ok(effect)
}

fn store(
    state: &ArchitecturalState,
    address: i64,
    value: i32,
    policy: AccessPolicy,
) -> Result<Effect, SimError> {
    let len = state.memory().len();
    match (resolve_index(address, len), policy) {
        (Some(_), _) => Ok(Effect::Memory { address, value }),
        (None, AccessPolicy::Strict) => Err(SimError::MemoryOutOfRange { address, len }),
        (None, AccessPolicy::Lenient) => {
            log::warn!("write of {value} to out-of-range address {address} dropped");
            Ok(Effect::Discarded { address })
        }
    }
}

/// Computes and applies the effect of `instruction`, returning what changed.
///
/// # Errors
///
/// Same as [`plan_effect`]; on error `state` is unchanged.
pub fn apply_effect(
    instruction: &Instruction,
    state: &mut ArchitecturalState,
    policy: AccessPolicy,
) -> Result<Effect, SimError> {
    let effect = plan_effect(instruction, state, policy)?;
    effect.apply_to(state)?;
    Ok(effect)
}
