//! Stage transition engine.
//!
//! A pure function of the current stage, the operator, the global cycle and
//! the predecessor's trace. Every structural hazard is resolved here.

use crate::hazard::PredecessorView;
use crate::operator::{ExecClass, Operator};
use crate::stage::{FpSlot, Stage};
use crate::trace::Trace;

/// Result of one engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    /// Stage for the next cycle.
    pub next: Stage,
    /// `next` repeats the current stage because of a conflict.
    pub stalled: bool,
    /// The instruction's effect lands this cycle.
    pub commit: bool,
}

impl Transition {
    const fn advance(next: Stage) -> Self {
        Self {
            next,
            stalled: false,
            commit: false,
        }
    }

    const fn stall(stage: Stage) -> Self {
        Self {
            next: stage,
            stalled: true,
            commit: false,
        }
    }
}

/// Computes where an instruction in `stage` goes after `cycle`.
#[must_use]
pub fn next_stage(
    stage: Stage,
    operator: Operator,
    cycle: usize,
    predecessor: &Trace,
) -> Transition {
    let view = PredecessorView::at(predecessor, cycle);

    let transition = match stage {
        Stage::Idle if view.releases_fetch() => Transition::advance(Stage::Fetch),
        Stage::Idle => Transition::advance(Stage::Idle),
        Stage::Fetch | Stage::Decode if view.holds() => Transition::stall(stage),
        Stage::Fetch => Transition::advance(Stage::Decode),
        Stage::Decode => leave_decode(operator.class(), view),
        Stage::Execute if operator.is_branch() => Transition::advance(Stage::Complete),
        Stage::Execute => enter_memory(stage, view),
        Stage::Fp(slot) => leave_fp_slot(slot, view),
        Stage::Mem1 if operator == Operator::LoadFp => Transition::advance(Stage::Mem2),
        Stage::Mem1 | Stage::Mem3 => Transition::advance(Stage::WriteBack),
        Stage::Mem2 => Transition::advance(Stage::Mem3),
        Stage::WriteBack | Stage::Complete => Transition::advance(Stage::Complete),
    };

    Transition {
        commit: operator.commit_stage() == Some(stage),
        ..transition
    }
}

fn leave_decode(class: ExecClass, view: PredecessorView) -> Transition {
    match class.fp_unit() {
        Some(unit) if view.blocks_entry(unit) => Transition::stall(Stage::Decode),
        _ => Transition::advance(class.entry_stage()),
    }
}

fn leave_fp_slot(slot: FpSlot, view: PredecessorView) -> Transition {
    match slot.advance() {
        Some(next) => Transition::advance(Stage::Fp(next)),
        None => enter_memory(Stage::Fp(slot), view),
    }
}

fn enter_memory(stage: Stage, view: PredecessorView) -> Transition {
    if view.memory_busy() {
        Transition::stall(stage)
    } else {
        Transition::advance(Stage::Mem1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{next_stage, Transition};
    use crate::operator::{Operator, OPERATOR_TABLE};
    use crate::stage::{FpUnit, Stage};
    use crate::trace::Trace;

    fn walk(operator: Operator, start: Stage, predecessor: &Trace) -> Vec<(Stage, bool)> {
        let mut stage = start;
        let mut stalled = false;
        let mut cycles = Vec::new();
        for cycle in 0..256 {
            cycles.push((stage, stalled));
            let step = next_stage(stage, operator, cycle, predecessor);
            if step.next == Stage::Complete {
                return cycles;
            }
            stage = step.next;
            stalled = step.stalled;
        }
        panic!("{operator} did not complete");
    }

    #[rstest]
    #[case(Operator::Add, &["IF", "ID", "EX", "MEM", "WB"])]
    #[case(Operator::LoadFp, &["IF", "ID", "EX", "MEM", "MEM2", "MEM3", "WB"])]
    #[case(Operator::FpSubtract, &["IF", "ID", "A1", "A2", "MEM", "WB"])]
    #[case(Operator::Jump, &["IF", "ID", "EX"])]
    fn uncontended_paths(#[case] operator: Operator, #[case] expected: &[&str]) {
        let stages: Vec<_> = walk(operator, Stage::Fetch, &Trace::default())
            .into_iter()
            .map(|(stage, _)| stage.to_string())
            .collect();
        assert_eq!(stages, expected);
    }

    #[test]
    fn divide_routes_to_the_divider() {
        let path = walk(Operator::FpDivide, Stage::Fetch, &Trace::default());
        assert_eq!(path[2].0, Stage::fp_first(FpUnit::Divider));
        assert_eq!(path.len(), 44);
    }

    #[test]
    fn idle_waits_for_the_fetch_unit() {
        let predecessor = Trace::from_stages([Stage::Idle, Stage::Fetch, Stage::Decode]);
        let idle = next_stage(Stage::Idle, Operator::Add, 0, &predecessor);
        assert_eq!(idle, Transition::advance(Stage::Idle));
        let fetch = next_stage(Stage::Idle, Operator::Add, 1, &predecessor);
        assert_eq!(fetch, Transition::advance(Stage::Fetch));
    }

    #[test]
    fn decode_stalls_while_same_unit_is_busy() {
        let predecessor = Trace::from_stages([
            Stage::Fetch,
            Stage::Decode,
            Stage::fp_first(FpUnit::Adder),
            Stage::fp_last(FpUnit::Adder),
        ]);
        assert_eq!(
            next_stage(Stage::Decode, Operator::FpAdd, 2, &predecessor),
            Transition::stall(Stage::Decode)
        );
        assert_eq!(
            next_stage(Stage::Decode, Operator::FpMultiply, 2, &predecessor).next,
            Stage::fp_first(FpUnit::Multiplier)
        );
    }

    #[test]
    fn adder_accepts_a_new_instruction_once_its_first_stage_frees() {
        let predecessor = Trace::from_stages([
            Stage::Fetch,
            Stage::Decode,
            Stage::fp_first(FpUnit::Adder),
            Stage::fp_last(FpUnit::Adder),
            Stage::Mem1,
        ]);
        assert_eq!(
            next_stage(Stage::Decode, Operator::FpSubtract, 3, &predecessor),
            Transition::advance(Stage::fp_first(FpUnit::Adder))
        );
    }

    #[test]
    fn commit_happens_at_mem_or_mem3() {
        let none = Trace::default();
        assert!(next_stage(Stage::Mem1, Operator::StoreWord, 0, &none).commit);
        assert!(!next_stage(Stage::Mem1, Operator::LoadFp, 0, &none).commit);
        assert!(next_stage(Stage::Mem3, Operator::LoadFp, 0, &none).commit);
        assert!(!next_stage(Stage::WriteBack, Operator::Add, 0, &none).commit);
    }

    #[test]
    fn each_operator_commits_once_at_its_commit_stage() {
        for info in OPERATOR_TABLE {
            let operator = info.operator;
            let mut stage = Stage::Fetch;
            let mut commits = Vec::new();
            for cycle in 0..64 {
                let step = next_stage(stage, operator, cycle, &Trace::default());
                if step.commit {
                    commits.push(stage);
                }
                if step.next == Stage::Complete {
                    break;
                }
                stage = step.next;
            }
            let expected: Vec<_> = operator.commit_stage().into_iter().collect();
            assert_eq!(commits, expected, "{operator}");
        }
    }

    #[test]
    fn complete_is_absorbing() {
        for operator in [Operator::Add, Operator::Jump, Operator::FpDivide] {
            assert_eq!(
                next_stage(Stage::Complete, operator, 3, &Trace::default()),
                Transition::advance(Stage::Complete)
            );
        }
    }
}
