//! Pipeline stages and the multi-stage floating-point functional units.
//!
//! Stages form a closed, totally ordered set. Hazard checks compare positions
//! within that order, so the derived `Ord` must follow declaration order:
//! `Idle < Fetch < Decode < Execute < A1..A2 < M1..M10 < D1..D40 < MEM <
//! MEM2 < MEM3 < WB < Complete`.

use std::fmt;

/// Multi-stage floating-point functional units, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FpUnit {
    /// Two-stage adder/subtracter.
    Adder,
    /// Ten-stage multiplier.
    Multiplier,
    /// Forty-stage divider.
    Divider,
}

impl FpUnit {
    /// All functional units in pipeline order.
    pub const ALL: [Self; 3] = [Self::Adder, Self::Multiplier, Self::Divider];

    /// Number of consecutive stages an instruction spends in this unit.
    #[must_use]
    pub const fn depth(self) -> u8 {
        match self {
            Self::Adder => 2,
            Self::Multiplier => 10,
            Self::Divider => 40,
        }
    }

    /// Single-letter prefix used by stage mnemonics (`A1`, `M7`, `D40`).
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Adder => 'A',
            Self::Multiplier => 'M',
            Self::Divider => 'D',
        }
    }

    /// Ordinal of this unit's first stage within [`Stage::ordinal`].
    const fn base_ordinal(self) -> u8 {
        match self {
            Self::Adder => 4,
            Self::Multiplier => 4 + Self::Adder.depth(),
            Self::Divider => 4 + Self::Adder.depth() + Self::Multiplier.depth(),
        }
    }
}

/// Position of an instruction inside a floating-point functional unit.
///
/// Steps are 1-based and bounded by [`FpUnit::depth`]; the constructor rejects
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFpSlot"))]
pub struct FpSlot {
    unit: FpUnit,
    step: u8,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFpSlot {
    unit: FpUnit,
    step: u8,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFpSlot> for FpSlot {
    type Error = String;

    fn try_from(raw: RawFpSlot) -> Result<Self, Self::Error> {
        Self::new(raw.unit, raw.step).ok_or_else(|| {
            format!(
                "step {} is outside 1..={} for the {:?} unit",
                raw.step,
                raw.unit.depth(),
                raw.unit
            )
        })
    }
}

impl FpSlot {
    /// Returns the slot for `step` of `unit`, or `None` when out of range.
    #[must_use]
    pub const fn new(unit: FpUnit, step: u8) -> Option<Self> {
        if step >= 1 && step <= unit.depth() {
            Some(Self { unit, step })
        } else {
            None
        }
    }

    /// Entry stage of `unit`.
    #[must_use]
    pub const fn first(unit: FpUnit) -> Self {
        Self { unit, step: 1 }
    }

    /// Final stage of `unit`, the one that waits for the memory stage.
    #[must_use]
    pub const fn last(unit: FpUnit) -> Self {
        Self {
            unit,
            step: unit.depth(),
        }
    }

    /// Functional unit this slot belongs to.
    #[must_use]
    pub const fn unit(self) -> FpUnit {
        self.unit
    }

    /// 1-based step within the unit.
    #[must_use]
    pub const fn step(self) -> u8 {
        self.step
    }

    /// Returns `true` for the unit's final stage.
    #[must_use]
    pub const fn is_last(self) -> bool {
        self.step == self.unit.depth()
    }

    /// The following step in the same unit, if any.
    #[must_use]
    pub const fn advance(self) -> Option<Self> {
        Self::new(self.unit, self.step + 1)
    }
}

/// One phase of the pipeline, occupied for a single simulated cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Stage {
    /// Waiting for the fetch unit; no resource claimed yet.
    #[default]
    Idle,
    /// Instruction fetch (`IF`).
    Fetch,
    /// Instruction decode (`ID`).
    Decode,
    /// Integer/branch execute (`EX`).
    Execute,
    /// Numbered stage of a floating-point functional unit.
    Fp(FpSlot),
    /// Memory access (`MEM`).
    Mem1,
    /// Second memory cycle of a floating-point load miss.
    Mem2,
    /// Third memory cycle of a floating-point load miss.
    Mem3,
    /// Write back (`WB`).
    WriteBack,
    /// Left the pipeline. Absorbing.
    Complete,
}

/// Number of distinct stage values.
pub const STAGE_COUNT: usize = 61;

impl Stage {
    /// First stage of `unit`.
    #[must_use]
    pub const fn fp_first(unit: FpUnit) -> Self {
        Self::Fp(FpSlot::first(unit))
    }

    /// Last stage of `unit`.
    #[must_use]
    pub const fn fp_last(unit: FpUnit) -> Self {
        Self::Fp(FpSlot::last(unit))
    }

    /// Flat position of this stage in the total order (`0..STAGE_COUNT`).
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        let divider_end = FpUnit::Divider.base_ordinal() + FpUnit::Divider.depth();
        match self {
            Self::Idle => 0,
            Self::Fetch => 1,
            Self::Decode => 2,
            Self::Execute => 3,
            Self::Fp(slot) => slot.unit.base_ordinal() + slot.step - 1,
            Self::Mem1 => divider_end,
            Self::Mem2 => divider_end + 1,
            Self::Mem3 => divider_end + 2,
            Self::WriteBack => divider_end + 3,
            Self::Complete => divider_end + 4,
        }
    }

    /// Functional unit occupied at this stage, if any.
    #[must_use]
    pub const fn fp_unit(self) -> Option<FpUnit> {
        match self {
            Self::Fp(slot) => Some(slot.unit),
            _ => None,
        }
    }

    /// Returns `true` when the stage occupies the memory unit.
    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Mem1 | Self::Mem2 | Self::Mem3)
    }

    /// Every stage in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        let fixed_head = [Self::Idle, Self::Fetch, Self::Decode, Self::Execute];
        let units = FpUnit::ALL.into_iter().flat_map(|unit| {
            (1..=unit.depth()).filter_map(move |step| FpSlot::new(unit, step).map(Self::Fp))
        });
        let fixed_tail = [
            Self::Mem1,
            Self::Mem2,
            Self::Mem3,
            Self::WriteBack,
            Self::Complete,
        ];
        fixed_head.into_iter().chain(units).chain(fixed_tail)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Fetch => f.write_str("IF"),
            Self::Decode => f.write_str("ID"),
            Self::Execute => f.write_str("EX"),
            Self::Fp(slot) => write!(f, "{}{}", slot.unit.prefix(), slot.step),
            Self::Mem1 => f.write_str("MEM"),
            Self::Mem2 => f.write_str("MEM2"),
            Self::Mem3 => f.write_str("MEM3"),
            Self::WriteBack => f.write_str("WB"),
            Self::Complete => f.write_str("complete"),
        }
    }
}
