//! Memory-reference resolution for loads and stores.

use crate::memory::AccessPolicy;
use crate::program::{AddressBase, MemoryRef};
use crate::state::ArchitecturalState;
use crate::SimError;

/// Word fetched by a load, plus the bias added to it.
///
/// A register base reads `memory[R[base]]` and biases it by the offset; a
/// literal base reads `memory[offset + literal]` with no bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoadOperand {
    pub(crate) word: i32,
    pub(crate) bias: i32,
}

pub(crate) fn load_operand(
    reference: MemoryRef,
    state: &ArchitecturalState,
    policy: AccessPolicy,
) -> Result<LoadOperand, SimError> {
    match reference.base {
        AddressBase::Register(reg) => Ok(LoadOperand {
            word: state.read_word(i64::from(state.int(reg)), policy)?,
            bias: reference.offset,
        }),
        AddressBase::Literal(base) => Ok(LoadOperand {
            word: state.read_word(i64::from(reference.offset) + i64::from(base), policy)?,
            bias: 0,
        }),
    }
}

/// Address written by a store: `offset + R[base]` or `offset + literal`.
pub(crate) fn store_address(reference: MemoryRef, state: &ArchitecturalState) -> i64 {
    let base = match reference.base {
        AddressBase::Register(reg) => state.int(reg),
        AddressBase::Literal(base) => base,
    };
    i64::from(reference.offset) + i64::from(base)
}

#[cfg(test)]
mod tests {
    use super::{load_operand, store_address, LoadOperand};
    use crate::memory::AccessPolicy;
    use crate::program::{AddressBase, MemoryRef};
    use crate::state::{ArchitecturalState, Register};

    fn reg(index: u32) -> Register {
        Register::new(index).expect("valid register")
    }

    #[test]
    fn register_base_reads_through_the_register_and_biases() {
        let mut state = ArchitecturalState::with_memory(vec![10, 20, 30]);
        state.set_int(reg(1), 2);
        let reference = MemoryRef {
            offset: 5,
            base: AddressBase::Register(reg(1)),
        };

        assert_eq!(
            load_operand(reference, &state, AccessPolicy::Strict),
            Ok(LoadOperand { word: 30, bias: 5 })
        );
        assert_eq!(store_address(reference, &state), 7);
    }

    #[test]
    fn literal_base_adds_offset_before_reading() {
        let state = ArchitecturalState::with_memory(vec![10, 20, 30]);
        let reference = MemoryRef {
            offset: -1,
            base: AddressBase::Literal(3),
        };

        assert_eq!(
            load_operand(reference, &state, AccessPolicy::Strict),
            Ok(LoadOperand { word: 30, bias: 0 })
        );
        assert_eq!(store_address(reference, &state), 2);
    }
}
