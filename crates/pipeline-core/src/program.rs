//! Program model: validated instructions plus label positions.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::operator::{OperandKind, Operator};
use crate::state::Register;

/// Base of a memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AddressBase {
    /// Register-indirect base (`offset($n)`).
    Register(Register),
    /// Literal base (`offset(n)`).
    Literal(i32),
}

/// Memory reference written `offset(base)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryRef {
    /// Signed offset.
    pub offset: i32,
    /// Register or literal base.
    pub base: AddressBase,
}

/// One operand reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// Integer register.
    IntRegister(Register),
    /// Floating-point register.
    FpRegister(Register),
    /// Signed immediate.
    Immediate(i32),
    /// Memory reference.
    Address(MemoryRef),
    /// Branch target name; resolution uses label positions, not the name.
    Label(String),
}

impl Operand {
    /// Kind of this operand.
    #[must_use]
    pub const fn kind(&self) -> OperandKind {
        match self {
            Self::IntRegister(_) => OperandKind::IntRegister,
            Self::FpRegister(_) => OperandKind::FpRegister,
            Self::Immediate(_) => OperandKind::Immediate,
            Self::Address(_) => OperandKind::Address,
            Self::Label(_) => OperandKind::Label,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntRegister(reg) => write!(f, "${reg}"),
            Self::FpRegister(reg) => write!(f, "F{reg}"),
            Self::Immediate(value) => write!(f, "{value}"),
            Self::Address(MemoryRef {
                offset,
                base: AddressBase::Register(reg),
            }) => write!(f, "{offset}(${reg})"),
            Self::Address(MemoryRef {
                offset,
                base: AddressBase::Literal(base),
            }) => write!(f, "{offset}({base})"),
            Self::Label(name) => f.write_str(name),
        }
    }
}

/// Errors raised while assembling a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// Wrong number of operands for the operator.
    #[error("{operator} takes {expected} operand(s), found {found}")]
    OperandCount {
        /// Operator being built.
        operator: Operator,
        /// Operands the signature requires.
        expected: usize,
        /// Operands supplied.
        found: usize,
    },
    /// Operand of the wrong kind at some position.
    #[error("{operator} operand {position} must be a {expected}, found a {found}")]
    OperandKind {
        /// Operator being built.
        operator: Operator,
        /// 1-based operand position.
        position: usize,
        /// Kind the signature requires.
        expected: OperandKind,
        /// Kind supplied.
        found: OperandKind,
    },
    /// Label position past the last instruction.
    #[error("label position {position} is outside a {len}-instruction program")]
    LabelOutOfRange {
        /// Offending position.
        position: usize,
        /// Program length.
        len: usize,
    },
}

/// An operator with operands matching its signature. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    operator: Operator,
    operands: Vec<Operand>,
}

impl Instruction {
    /// Validates `operands` against the operator's signature.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::OperandCount`] or [`ProgramError::OperandKind`]
    /// when the operands do not match.
    pub fn new(operator: Operator, operands: Vec<Operand>) -> Result<Self, ProgramError> {
        let signature = operator.signature();
        if signature.len() != operands.len() {
            return Err(ProgramError::OperandCount {
                operator,
                expected: signature.len(),
                found: operands.len(),
            });
        }

        for (position, (expected, operand)) in signature.iter().zip(&operands).enumerate() {
            if operand.kind() != *expected {
                return Err(ProgramError::OperandKind {
                    operator,
                    position: position + 1,
                    expected: *expected,
                    found: operand.kind(),
                });
            }
        }

        Ok(Self { operator, operands })
    }

    /// Instruction kind.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Operands in source order.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator.mnemonic())?;
        for (position, operand) in self.operands.iter().enumerate() {
            let separator = if position == 0 { " " } else { ", " };
            write!(f, "{separator}{operand}")?;
        }
        Ok(())
    }
}

/// Ordered instructions plus the positions marked as branch targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: BTreeSet<usize>,
}

impl Program {
    /// Builds a program, checking every label position.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::LabelOutOfRange`] for a label at or past the
    /// end of `instructions`.
    pub fn new(
        instructions: Vec<Instruction>,
        labels: impl IntoIterator<Item = usize>,
    ) -> Result<Self, ProgramError> {
        let len = instructions.len();
        let labels = labels
            .into_iter()
            .map(|position| {
                if position < len {
                    Ok(position)
                } else {
                    Err(ProgramError::LabelOutOfRange { position, len })
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            instructions,
            labels,
        })
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` for a program with no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// All instructions in program order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns `true` when `index` is a label position.
    #[must_use]
    pub fn is_label(&self, index: usize) -> bool {
        self.labels.contains(&index)
    }

    /// Label positions in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter().copied()
    }

    /// Nearest label position at or before `index`, or 0 when there is none.
    #[must_use]
    pub fn label_at_or_before(&self, index: usize) -> usize {
        self.labels.range(..=index).next_back().copied().unwrap_or(0)
    }
}
