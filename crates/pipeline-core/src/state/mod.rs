//! Architectural state: register files and data memory.

/// Register identifiers and fixed-size register files.
pub mod registers;

pub use registers::{Register, RegisterError, RegisterFile, REGISTER_COUNT};

use crate::memory::{default_memory, resolve_index, AccessPolicy};
use crate::SimError;

/// Integer and floating-point register files plus word-addressable memory.
///
/// Only the effect applier mutates this during a run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    int: RegisterFile<i32>,
    fp: RegisterFile<f32>,
    memory: Vec<i32>,
}

impl Default for ArchitecturalState {
    fn default() -> Self {
        Self::with_memory(default_memory())
    }
}

impl ArchitecturalState {
    /// Creates zeroed register files over the given memory image.
    #[must_use]
    pub fn with_memory(memory: Vec<i32>) -> Self {
        Self {
            int: RegisterFile::default(),
            fp: RegisterFile::default(),
            memory,
        }
    }

    /// Reads an integer register.
    #[must_use]
    pub const fn int(&self, reg: Register) -> i32 {
        self.int.get(reg)
    }

    /// Writes an integer register.
    pub fn set_int(&mut self, reg: Register, value: i32) {
        self.int.set(reg, value);
    }

    /// Reads a floating-point register.
    #[must_use]
    pub const fn fp(&self, reg: Register) -> f32 {
        self.fp.get(reg)
    }

    /// Writes a floating-point register.
    pub fn set_fp(&mut self, reg: Register, value: f32) {
        self.fp.set(reg, value);
    }

    /// Integer register file.
    #[must_use]
    pub const fn int_registers(&self) -> &RegisterFile<i32> {
        &self.int
    }

    /// Floating-point register file.
    #[must_use]
    pub const fn fp_registers(&self) -> &RegisterFile<f32> {
        &self.fp
    }

    /// Memory contents in address order.
    #[must_use]
    pub fn memory(&self) -> &[i32] {
        &self.memory
    }

    /// Reads the word at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MemoryOutOfRange`] under [`AccessPolicy::Strict`]
    /// when `address` is outside memory. Lenient reads yield 0 instead.
    pub fn read_word(&self, address: i64, policy: AccessPolicy) -> Result<i32, SimError> {
        match resolve_index(address, self.memory.len()) {
            Some(index) => Ok(self.memory[index]),
            None => match policy {
                AccessPolicy::Strict => Err(self.out_of_range(address)),
                AccessPolicy::Lenient => {
                    log::warn!("read of out-of-range address {address} yields 0");
                    Ok(0)
                }
            },
        }
    }

    /// Writes `value` to `address`.
    ///
    /// Lenient stores never get here: the effect planner turns them into
    /// [`crate::Effect::Discarded`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MemoryOutOfRange`] when `address` is outside memory.
    pub fn write_word(&mut self, address: i64, value: i32) -> Result<(), SimError> {
        let index = resolve_index(address, self.memory.len())
            .ok_or_else(|| self.out_of_range(address))?;
        self.memory[index] = value;
        Ok(())
    }

    fn out_of_range(&self, address: i64) -> SimError {
        SimError::MemoryOutOfRange {
            address,
            len: self.memory.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchitecturalState, Register};
    use crate::memory::{AccessPolicy, DEFAULT_MEMORY_IMAGE};
    use crate::SimError;

    fn reg(index: u32) -> Register {
        Register::new(index).expect("valid register")
    }

    #[test]
    fn default_state_uses_demonstration_memory() {
        let state = ArchitecturalState::default();
        assert_eq!(state.memory(), &DEFAULT_MEMORY_IMAGE);
        assert!(state.int_registers().as_slice().iter().all(|v| *v == 0));
    }

    #[test]
    fn register_files_are_independent() {
        let mut state = ArchitecturalState::default();
        state.set_int(reg(3), 17);
        state.set_fp(reg(3), 2.5);

        assert_eq!(state.int(reg(3)), 17);
        assert!((state.fp(reg(3)) - 2.5).abs() < f32::EPSILON);
        assert_eq!(state.int(reg(4)), 0);
    }

    #[test]
    fn strict_accesses_outside_memory_fault_without_mutation() {
        let mut state = ArchitecturalState::with_memory(vec![1, 2, 3]);

        assert_eq!(
            state.read_word(3, AccessPolicy::Strict),
            Err(SimError::MemoryOutOfRange { address: 3, len: 3 })
        );
        assert_eq!(
            state.write_word(-1, 9),
            Err(SimError::MemoryOutOfRange {
                address: -1,
                len: 3
            })
        );
        assert_eq!(state.memory(), &[1, 2, 3]);
    }

    #[test]
    fn lenient_reads_yield_zero() {
        let state = ArchitecturalState::with_memory(vec![1, 2, 3]);

        assert_eq!(state.read_word(40, AccessPolicy::Lenient), Ok(0));
        assert_eq!(state.read_word(1, AccessPolicy::Lenient), Ok(2));
    }

    #[test]
    fn in_range_writes_land() {
        let mut state = ArchitecturalState::with_memory(vec![1, 2, 3]);

        assert_eq!(state.write_word(1, 9), Ok(()));
        assert_eq!(state.memory(), &[1, 9, 3]);
    }
}
