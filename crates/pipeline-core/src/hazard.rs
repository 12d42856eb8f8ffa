use crate::stage::{FpUnit, Stage};
use crate::trace::Trace;

/// The predecessor's position around one global cycle.
#[derive(Debug, Clone, Copy)]
pub struct PredecessorView {
    now: Stage,
    ahead: Option<Stage>,
}

impl PredecessorView {
    /// Looks at `predecessor` at `cycle` and the cycle after it.
    #[must_use]
    pub fn at(predecessor: &Trace, cycle: usize) -> Self {
        Self {
            now: predecessor.stage_at(cycle),
            ahead: predecessor.next_recorded(cycle),
        }
    }

    /// Stage the predecessor occupies this cycle (`Complete` once it has left).
    #[must_use]
    pub const fn now(self) -> Stage {
        self.now
    }

    /// Stage the predecessor occupies next cycle, if recorded.
    #[must_use]
    pub const fn ahead(self) -> Option<Stage> {
        self.ahead
    }

    /// Returns `true` when the predecessor repeats its stage next cycle.
    #[must_use]
    pub fn holds(self) -> bool {
        self.ahead == Some(self.now)
    }

    /// Returns `true` when the predecessor currently sits in any stage of `unit`.
    #[must_use]
    pub fn occupies(self, unit: FpUnit) -> bool {
        self.now.fp_unit() == Some(unit)
    }

    /// Returns `true` when an instruction may not enter `unit` next cycle.
    ///
    /// The adder is only blocked while its first stage is taken; the
    /// multiplier and divider accept one instruction for their whole depth.
    #[must_use]
    pub fn blocks_entry(self, unit: FpUnit) -> bool {
        match unit {
            FpUnit::Adder => self.now == Stage::fp_first(unit),
            FpUnit::Multiplier | FpUnit::Divider => self.occupies(unit),
        }
    }

    /// Returns `true` when the fetch unit frees up after this cycle.
    #[must_use]
    pub fn releases_fetch(self) -> bool {
        self.now == Stage::Fetch && self.ahead != Some(Stage::Fetch)
    }

    /// Returns `true` when entering `MEM` next cycle would overtake or collide
    /// with the predecessor.
    #[must_use]
    pub fn memory_busy(self) -> bool {
        self.now < Stage::Mem1
            || self.ahead == Some(Stage::Mem1)
            || self.holds()
            || matches!(
                (self.now, self.ahead),
                (Stage::Mem1, Some(Stage::Mem2)) | (Stage::Mem2, Some(Stage::Mem3))
            )
    }
}
