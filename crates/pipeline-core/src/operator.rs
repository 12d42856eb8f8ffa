use std::fmt;

use crate::stage::{FpUnit, Stage};

/// Execution class: decides routing after decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ExecClass {
    /// One `EX` cycle, then the memory stage(s).
    IntegerMemory,
    /// Two-stage floating-point adder, then memory.
    FpAdd,
    /// Ten-stage floating-point multiplier, then memory.
    FpMultiply,
    /// Forty-stage floating-point divider, then memory.
    FpDivide,
    /// Completes straight after `EX`; never reaches memory or write back.
    Branch,
}

impl ExecClass {
    /// Floating-point unit used by this class, if any.
    #[must_use]
    pub const fn fp_unit(self) -> Option<FpUnit> {
        match self {
            Self::FpAdd => Some(FpUnit::Adder),
            Self::FpMultiply => Some(FpUnit::Multiplier),
            Self::FpDivide => Some(FpUnit::Divider),
            Self::IntegerMemory | Self::Branch => None,
        }
    }

    /// Stage entered when leaving `Decode`.
    #[must_use]
    pub const fn entry_stage(self) -> Stage {
        match self.fp_unit() {
            Some(unit) => Stage::fp_first(unit),
            None => Stage::Execute,
        }
    }
}

/// Kind of operand expected at one position of an operator's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandKind {
    /// Integer register (`$n`).
    IntRegister,
    /// Floating-point register (`Fn`).
    FpRegister,
    /// Signed immediate.
    Immediate,
    /// Memory reference `offset(base)`.
    Address,
    /// Branch target label.
    Label,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IntRegister => "integer register",
            Self::FpRegister => "floating-point register",
            Self::Immediate => "immediate",
            Self::Address => "memory reference",
            Self::Label => "label",
        };
        f.write_str(name)
    }
}

/// Closed set of instruction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operator {
    /// `L.D`: load a floating-point register from memory (always misses).
    LoadFp,
    /// `S.D`: store a floating-point register to memory.
    StoreFp,
    /// `LI`: load an immediate into an integer register.
    LoadImmediate,
    /// `LW`: load an integer register from memory.
    LoadWord,
    /// `SW`: store an integer register to memory.
    StoreWord,
    /// `ADDI`: integer add with immediate.
    AddImmediate,
    /// `ADD`: integer add.
    Add,
    /// `SUB`: integer subtract.
    Subtract,
    /// `ADD.D`: floating-point add.
    FpAdd,
    /// `SUB.D`: floating-point subtract.
    FpSubtract,
    /// `MUL.D`: floating-point multiply.
    FpMultiply,
    /// `DIV.D`: floating-point divide.
    FpDivide,
    /// `BEQ`: branch when two integer registers are equal.
    BranchEqual,
    /// `BNE`: branch when two integer registers differ.
    BranchNotEqual,
    /// `J`: unconditional jump.
    Jump,
}

/// Static description of one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Operator described by this row.
    pub operator: Operator,
    /// Assembly mnemonic.
    pub mnemonic: &'static str,
    /// Execution class.
    pub class: ExecClass,
    /// Operand kinds, in source order.
    pub signature: &'static [OperandKind],
}

const MEM_FP: &[OperandKind] = &[OperandKind::FpRegister, OperandKind::Address];
const MEM_INT: &[OperandKind] = &[OperandKind::IntRegister, OperandKind::Address];
const INT_IMM: &[OperandKind] = &[OperandKind::IntRegister, OperandKind::Immediate];
const INT_INT_IMM: &[OperandKind] = &[
    OperandKind::IntRegister,
    OperandKind::IntRegister,
    OperandKind::Immediate,
];
const INT3: &[OperandKind] = &[
    OperandKind::IntRegister,
    OperandKind::IntRegister,
    OperandKind::IntRegister,
];
const FP3: &[OperandKind] = &[
    OperandKind::FpRegister,
    OperandKind::FpRegister,
    OperandKind::FpRegister,
];
const CMP_BRANCH: &[OperandKind] = &[
    OperandKind::IntRegister,
    OperandKind::IntRegister,
    OperandKind::Label,
];
const JUMP: &[OperandKind] = &[OperandKind::Label];

const fn row(
    operator: Operator,
    mnemonic: &'static str,
    class: ExecClass,
    signature: &'static [OperandKind],
) -> OperatorInfo {
    OperatorInfo {
        operator,
        mnemonic,
        class,
        signature,
    }
}

/// Single source of truth for mnemonics, classes and operand signatures.
///
/// Rows follow [`Operator`] declaration order so lookups can index directly.
pub const OPERATOR_TABLE: &[OperatorInfo] = &[
    row(Operator::LoadFp, "L.D", ExecClass::IntegerMemory, MEM_FP),
    row(Operator::StoreFp, "S.D", ExecClass::IntegerMemory, MEM_FP),
    row(Operator::LoadImmediate, "LI", ExecClass::IntegerMemory, INT_IMM),
    row(Operator::LoadWord, "LW", ExecClass::IntegerMemory, MEM_INT),
    row(Operator::StoreWord, "SW", ExecClass::IntegerMemory, MEM_INT),
    row(Operator::AddImmediate, "ADDI", ExecClass::IntegerMemory, INT_INT_IMM),
    row(Operator::Add, "ADD", ExecClass::IntegerMemory, INT3),
    row(Operator::Subtract, "SUB", ExecClass::IntegerMemory, INT3),
    row(Operator::FpAdd, "ADD.D", ExecClass::FpAdd, FP3),
    row(Operator::FpSubtract, "SUB.D", ExecClass::FpAdd, FP3),
    row(Operator::FpMultiply, "MUL.D", ExecClass::FpMultiply, FP3),
    row(Operator::FpDivide, "DIV.D", ExecClass::FpDivide, FP3),
    row(Operator::BranchEqual, "BEQ", ExecClass::Branch, CMP_BRANCH),
    row(Operator::BranchNotEqual, "BNE", ExecClass::Branch, CMP_BRANCH),
    row(Operator::Jump, "J", ExecClass::Branch, JUMP),
];

impl Operator {
    /// Table row describing this operator.
    #[must_use]
    pub const fn info(self) -> &'static OperatorInfo {
        &OPERATOR_TABLE[self as usize]
    }

    /// Looks up an operator by its exact (upper-case) mnemonic.
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        OPERATOR_TABLE
            .iter()
            .find_map(|info| (info.mnemonic == mnemonic).then_some(info.operator))
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    /// Execution class.
    #[must_use]
    pub const fn class(self) -> ExecClass {
        self.info().class
    }

    /// Operand kinds in source order.
    #[must_use]
    pub const fn signature(self) -> &'static [OperandKind] {
        self.info().signature
    }

    /// Returns `true` for the branch class.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(self.class(), ExecClass::Branch)
    }

    /// Cycles spent in the memory unit: three for the missing `L.D`, one otherwise.
    #[must_use]
    pub const fn memory_cycles(self) -> u8 {
        match self {
            Self::LoadFp => 3,
            _ if self.is_branch() => 0,
            _ => 1,
        }
    }

    /// Stage at which the architectural effect lands; `None` for branches.
    #[must_use]
    pub const fn commit_stage(self) -> Option<Stage> {
        match self {
            Self::LoadFp => Some(Stage::Mem3),
            _ if self.is_branch() => None,
            _ => Some(Stage::Mem1),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
