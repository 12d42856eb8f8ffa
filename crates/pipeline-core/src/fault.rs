use std::fmt;

use thiserror::Error;

use crate::operator::Operator;

/// Fault classes used for reporting and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// An operator reached a pipeline point it has no behaviour for.
    Configuration,
    /// A memory access fell outside the configured array.
    Memory,
    /// Operand list did not match the operator.
    Operands,
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Memory => "memory",
            Self::Operands => "operands",
        })
    }
}

/// Fatal runtime conditions raised while simulating an instruction.
///
/// None of these are recoverable: the driver halts and the architectural
/// state stays as of the last completed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SimError {
    /// The effect applier received an operator with no architectural effect.
    #[error("operator {operator} has no architectural effect")]
    Configuration {
        /// Offending operator.
        operator: Operator,
    },
    /// Strict-policy access outside the memory array.
    #[error("memory address {address} is outside the {len}-word memory")]
    MemoryOutOfRange {
        /// Resolved word address.
        address: i64,
        /// Configured memory length in words.
        len: usize,
    },
    /// Operand list does not match the operator's signature.
    #[error("operands do not match the signature of {operator}")]
    MalformedOperands {
        /// Operator whose operands were malformed.
        operator: Operator,
    },
}

impl SimError {
    /// Returns the reporting class for this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::Configuration { .. } => FaultClass::Configuration,
            Self::MemoryOutOfRange { .. } => FaultClass::Memory,
            Self::MalformedOperands { .. } => FaultClass::Operands,
        }
    }
}
