use std::fmt;

use thiserror::Error;

/// Number of registers in each register file (`$0..$31`, `F0..F31`).
pub const REGISTER_COUNT: usize = 32;

/// Register index rejected because it is outside `0..REGISTER_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("register index {0} is outside 0..{max}", max = REGISTER_COUNT)]
pub struct RegisterError(pub u32);

/// Checked index into a register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// Validates a raw register number.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError`] when `index >= REGISTER_COUNT`.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(index: u32) -> Result<Self, RegisterError> {
        if index < REGISTER_COUNT as u32 {
            Ok(Self(index as u8))
        } else {
            Err(RegisterError(index))
        }
    }

    /// Array index for this register.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every register in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..REGISTER_COUNT as u8).map(Self)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-size register file.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile<T> {
    values: [T; REGISTER_COUNT],
}

impl<T: Copy + Default> Default for RegisterFile<T> {
    fn default() -> Self {
        Self {
            values: [T::default(); REGISTER_COUNT],
        }
    }
}

impl<T: Copy> RegisterFile<T> {
    /// Reads a register.
    #[must_use]
    pub const fn get(&self, reg: Register) -> T {
        self.values[reg.index()]
    }

    /// Writes a register.
    pub fn set(&mut self, reg: Register, value: T) {
        self.values[reg.index()] = value;
    }

    /// All register values in index order.
    #[must_use]
    pub const fn as_slice(&self) -> &[T] {
        &self.values
    }
}
