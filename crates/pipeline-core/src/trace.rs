//! Per-instruction cycle traces and the recorder that builds them.

use crate::execute::{apply_effect, Effect};
use crate::memory::AccessPolicy;
use crate::program::Instruction;
use crate::stage::Stage;
use crate::state::ArchitecturalState;
use crate::transition::next_stage;
use crate::SimError;

/// One occupied cycle of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceEntry {
    /// Stage held during the cycle.
    pub stage: Stage,
    /// Set when the stage repeats the previous cycle's because of a conflict.
    pub stalled: bool,
}

/// Stages occupied by one instruction, indexed by global cycle.
///
/// The terminal `Complete` is not stored: reading past the end yields it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Builds an unstalled trace from raw stages.
    #[must_use]
    pub fn from_stages(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            entries: stages
                .into_iter()
                .map(|stage| TraceEntry {
                    stage,
                    stalled: false,
                })
                .collect(),
        }
    }

    /// Stage at `cycle`, or `Complete` past the end.
    #[must_use]
    pub fn stage_at(&self, cycle: usize) -> Stage {
        self.entries
            .get(cycle)
            .map_or(Stage::Complete, |entry| entry.stage)
    }

    /// Stage recorded for the cycle after `cycle`, if any.
    #[must_use]
    pub fn next_recorded(&self, cycle: usize) -> Option<Stage> {
        self.entries.get(cycle + 1).map(|entry| entry.stage)
    }

    /// Number of recorded cycles, which is also the global cycle at which
    /// the instruction left the pipeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a trace with no recorded cycles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stalled cycles.
    #[must_use]
    pub fn stall_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.stalled).count()
    }

    /// Entries in cycle order.
    pub fn iter(&self) -> std::slice::Iter<'_, TraceEntry> {
        self.entries.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    fn push(&mut self, stage: Stage, stalled: bool) {
        self.entries.push(TraceEntry { stage, stalled });
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceEntry;
    type IntoIter = std::slice::Iter<'a, TraceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An architectural effect together with the cycle it landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Committed {
    /// Global cycle of the commit stage.
    pub cycle: usize,
    /// Effect applied.
    pub effect: Effect,
}

/// Walks instructions through the transition engine one at a time.
///
/// Holds the most recently completed trace, which is the only view later
/// instructions have of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    predecessor: Trace,
    issued: u64,
}

impl TraceRecorder {
    /// Creates a recorder with no predecessor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently completed trace.
    #[must_use]
    pub const fn predecessor(&self) -> &Trace {
        &self.predecessor
    }

    /// Number of traces started so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Records `instruction` until it reaches `Complete`, applying its
    /// effect at the commit stage.
    ///
    /// On success the new trace replaces the predecessor.
    ///
    /// # Errors
    ///
    /// Propagates the applier's [`SimError`]. The predecessor and the state
    /// are left untouched when the effect faults.
    pub fn record(
        &mut self,
        instruction: &Instruction,
        state: &mut ArchitecturalState,
        policy: AccessPolicy,
    ) -> Result<Option<Committed>, SimError> {
        let operator = instruction.operator();
        let mut stage = if self.issued == 0 {
            Stage::Fetch
        } else {
            Stage::Idle
        };
        self.issued += 1;

        let mut trace = Trace::default();
        let mut stalled = false;
        let mut committed = None;

        loop {
            let cycle = trace.len();
            trace.push(stage, stalled);

            let transition = next_stage(stage, operator, cycle, &self.predecessor);
            if transition.stalled {
                log::trace!("{operator} stalls in {stage} at cycle {cycle}");
            }
            if transition.commit {
                let effect = apply_effect(instruction, state, policy)?;
                log::debug!("{operator} commits at cycle {cycle}: {effect:?}");
                committed = Some(Committed { cycle, effect });
            }
            if transition.next == Stage::Complete {
                break;
            }

            stage = transition.next;
            stalled = transition.stalled;
        }

        self.predecessor = trace;
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Trace, TraceRecorder};
    use crate::memory::AccessPolicy;
    use crate::operator::Operator;
    use crate::program::{Instruction, Operand};
    use crate::stage::Stage;
    use crate::state::{ArchitecturalState, Register};

    fn add(dest: u32, lhs: u32, rhs: u32) -> Instruction {
        let reg = |i| Operand::IntRegister(Register::new(i).expect("valid register"));
        Instruction::new(Operator::Add, vec![reg(dest), reg(lhs), reg(rhs)])
            .expect("well-formed ADD")
    }

    #[test]
    fn reading_past_the_end_yields_complete() {
        let trace = Trace::from_stages([Stage::Fetch, Stage::Decode]);
        assert_eq!(trace.stage_at(1), Stage::Decode);
        assert_eq!(trace.stage_at(2), Stage::Complete);
        assert_eq!(trace.next_recorded(0), Some(Stage::Decode));
        assert_eq!(trace.next_recorded(1), None);
        assert_eq!(trace.stall_count(), 0);
    }

    #[test]
    fn first_issue_starts_at_fetch_and_later_issues_idle() {
        let mut recorder = TraceRecorder::new();
        let mut state = ArchitecturalState::default();

        recorder
            .record(&add(3, 1, 2), &mut state, AccessPolicy::Strict)
            .expect("no fault");
        assert_eq!(recorder.predecessor().stage_at(0), Stage::Fetch);
        assert_eq!(recorder.predecessor().len(), 5);

        recorder
            .record(&add(4, 1, 2), &mut state, AccessPolicy::Strict)
            .expect("no fault");
        assert_eq!(recorder.predecessor().stage_at(0), Stage::Idle);
        assert_eq!(recorder.predecessor().stage_at(1), Stage::Fetch);
        assert_eq!(recorder.predecessor().len(), 6);
        assert_eq!(recorder.issued(), 2);
    }

    #[test]
    fn commit_lands_on_the_memory_cycle() {
        let mut recorder = TraceRecorder::new();
        let mut state = ArchitecturalState::default();
        let committed = recorder
            .record(&add(3, 1, 2), &mut state, AccessPolicy::Strict)
            .expect("no fault")
            .expect("ADD commits");

        assert_eq!(committed.cycle, 3);
        assert_eq!(recorder.predecessor().stage_at(3), Stage::Mem1);
    }
}
