//! Driver loop: issues instructions in program order and follows branches.

use crate::api::{RunOutcome, SimConfig, SimEvent, StepOutcome, StopReason, TraceSink};
use crate::branch::{branch_taken, next_index};
use crate::program::{Instruction, Program};
use crate::state::ArchitecturalState;
use crate::trace::{Trace, TraceRecorder};
use crate::SimError;

/// Owns everything a run needs: program, state and the predecessor trace.
#[derive(Debug, Clone)]
pub struct Simulator {
    program: Program,
    state: ArchitecturalState,
    config: SimConfig,
    recorder: TraceRecorder,
    next: usize,
    issued: u64,
    fault: Option<(usize, SimError)>,
}

impl Simulator {
    /// Creates a simulator positioned at index 0.
    #[must_use]
    pub fn new(program: Program, state: ArchitecturalState, config: SimConfig) -> Self {
        Self {
            program,
            state,
            config,
            recorder: TraceRecorder::new(),
            next: 0,
            issued: 0,
            fault: None,
        }
    }

    /// Current architectural state.
    #[must_use]
    pub const fn state(&self) -> &ArchitecturalState {
        &self.state
    }

    /// Consumes the simulator, returning its state.
    #[must_use]
    pub fn into_state(self) -> ArchitecturalState {
        self.state
    }

    /// Most recently completed trace.
    #[must_use]
    pub const fn predecessor(&self) -> &Trace {
        self.recorder.predecessor()
    }

    /// Index issued by the next `step`.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.next
    }

    /// Instructions issued so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    /// Returns `true` once the next index is past the last instruction.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.fault.is_none() && self.next >= self.program.len()
    }

    /// Issues one instruction and records its trace.
    ///
    /// After a fault every later call reports the same fault.
    pub fn step(&mut self, sink: &mut dyn TraceSink) -> StepOutcome {
        if let Some((index, error)) = &self.fault {
            return StepOutcome::Fault {
                index: *index,
                error: error.clone(),
            };
        }

        let index = self.next;
        let Some(instruction) = self.program.get(index).cloned() else {
            return StepOutcome::Finished;
        };

        log::debug!("issue #{} at index {index}: {instruction}", self.issued);
        self.emit(
            sink,
            SimEvent::Issued {
                index,
                instruction: &instruction,
            },
        );
        self.issued += 1;

        let committed =
            match self
                .recorder
                .record(&instruction, &mut self.state, self.config.access_policy)
            {
                Ok(committed) => committed,
                Err(error) => return self.latch_fault(sink, index, error),
            };

        if let Some(committed) = committed {
            self.emit(
                sink,
                SimEvent::EffectCommitted {
                    index,
                    cycle: committed.cycle,
                    effect: committed.effect,
                },
            );
        }

        if self.config.events_enabled {
            sink.on_event(SimEvent::TraceCompleted {
                index,
                trace: self.recorder.predecessor(),
            });
        }

        let next_index = match self.resolve_next(sink, index, &instruction) {
            Ok(next_index) => next_index,
            Err(error) => return self.latch_fault(sink, index, error),
        };
        self.next = next_index;

        let trace = self.recorder.predecessor();
        StepOutcome::Retired {
            index,
            next_index,
            cycles: trace.len(),
            stalls: trace.stall_count(),
        }
    }

    /// Steps until the program ends, a fault occurs or the issue limit is hit.
    pub fn run(&mut self, sink: &mut dyn TraceSink) -> RunOutcome {
        let issued_before = self.issued;

        let stop = loop {
            if let Some(limit) = self.config.issue_limit {
                if self.issued >= limit && self.fault.is_none() && !self.is_finished() {
                    log::warn!("issue limit of {limit} reached at index {}", self.next);
                    break StopReason::IssueLimit { limit };
                }
            }

            match self.step(sink) {
                StepOutcome::Retired { .. } => {}
                StepOutcome::Finished => break StopReason::ProgramEnd,
                StepOutcome::Fault { index, error } => break StopReason::Fault { index, error },
            }
        };

        RunOutcome {
            issued: self.issued - issued_before,
            total_cycles: self.recorder.predecessor().len(),
            stop,
        }
    }

    fn resolve_next(
        &self,
        sink: &mut dyn TraceSink,
        index: usize,
        instruction: &Instruction,
    ) -> Result<usize, SimError> {
        if !instruction.operator().is_branch() {
            return Ok(index + 1);
        }

        let taken = branch_taken(instruction, &self.state)?;
        let next_index = next_index(&self.program, index, taken);
        log::debug!(
            "{} at index {index} taken={taken}, next {next_index}",
            instruction.operator()
        );
        self.emit(
            sink,
            SimEvent::BranchResolved {
                index,
                taken,
                next_index,
            },
        );
        Ok(next_index)
    }

    fn latch_fault(
        &mut self,
        sink: &mut dyn TraceSink,
        index: usize,
        error: SimError,
    ) -> StepOutcome {
        log::error!("instruction {index} faulted: {error}");
        self.emit(
            sink,
            SimEvent::Faulted {
                index,
                error: &error,
            },
        );
        self.fault = Some((index, error.clone()));
        StepOutcome::Fault { index, error }
    }

    fn emit(&self, sink: &mut dyn TraceSink, event: SimEvent<'_>) {
        if self.config.events_enabled {
            sink.on_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Simulator;
    use crate::api::{NullSink, SimConfig, SimEvent, StepOutcome, StopReason, TraceSink};
    use crate::operator::Operator;
    use crate::program::{AddressBase, Instruction, MemoryRef, Operand, Program};
    use crate::state::{ArchitecturalState, Register};
    use crate::SimError;

    #[derive(Default)]
    struct Counts {
        issued: usize,
        committed: usize,
        traces: usize,
        branches: usize,
        faults: usize,
    }

    impl TraceSink for Counts {
        fn on_event(&mut self, event: SimEvent<'_>) {
            match event {
                SimEvent::Issued { .. } => self.issued += 1,
                SimEvent::EffectCommitted { .. } => self.committed += 1,
                SimEvent::TraceCompleted { .. } => self.traces += 1,
                SimEvent::BranchResolved { .. } => self.branches += 1,
                SimEvent::Faulted { .. } => self.faults += 1,
            }
        }
    }

    fn int(index: u32) -> Operand {
        Operand::IntRegister(Register::new(index).expect("valid register"))
    }

    fn li(dest: u32, value: i32) -> Instruction {
        Instruction::new(
            Operator::LoadImmediate,
            vec![int(dest), Operand::Immediate(value)],
        )
        .expect("well-formed LI")
    }

    #[test]
    fn empty_program_finishes_immediately() {
        let mut sim = Simulator::new(
            Program::default(),
            ArchitecturalState::default(),
            SimConfig::default(),
        );

        assert_eq!(sim.step(&mut NullSink), StepOutcome::Finished);
        let outcome = sim.run(&mut NullSink);
        assert_eq!(outcome.issued, 0);
        assert_eq!(outcome.total_cycles, 0);
        assert_eq!(outcome.stop, StopReason::ProgramEnd);
    }

    #[test]
    fn straight_line_program_emits_one_trace_per_instruction() {
        let program = Program::new(vec![li(1, 4), li(2, 5)], []).expect("valid program");
        let mut sim = Simulator::new(program, ArchitecturalState::default(), SimConfig::default());
        let mut counts = Counts::default();

        let outcome = sim.run(&mut counts);

        assert_eq!(outcome.stop, StopReason::ProgramEnd);
        assert_eq!(outcome.issued, 2);
        assert_eq!(outcome.total_cycles, 6);
        assert_eq!(counts.issued, 2);
        assert_eq!(counts.committed, 2);
        assert_eq!(counts.traces, 2);
        assert_eq!(counts.branches, 0);
        assert_eq!(sim.state().int(Register::new(2).expect("valid register")), 5);
    }

    #[test]
    fn disabled_events_skip_the_sink() {
        let program = Program::new(vec![li(1, 4)], []).expect("valid program");
        let config = SimConfig {
            events_enabled: false,
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(program, ArchitecturalState::default(), config);
        let mut counts = Counts::default();

        sim.run(&mut counts);
        assert_eq!(counts.issued + counts.traces + counts.committed, 0);
    }

    #[test]
    fn fault_latches_and_preserves_state() {
        let store = Instruction::new(
            Operator::StoreWord,
            vec![
                int(1),
                Operand::Address(MemoryRef {
                    offset: 100,
                    base: AddressBase::Literal(0),
                }),
            ],
        )
        .expect("well-formed SW");
        let program = Program::new(vec![li(1, 9), store, li(2, 3)], []).expect("valid program");
        let mut sim = Simulator::new(program, ArchitecturalState::default(), SimConfig::default());
        let mut counts = Counts::default();

        let outcome = sim.run(&mut counts);
        let expected_error = SimError::MemoryOutOfRange {
            address: 100,
            len: 19,
        };

        assert_eq!(
            outcome.stop,
            StopReason::Fault {
                index: 1,
                error: expected_error.clone()
            }
        );
        assert_eq!(outcome.total_cycles, 5);
        assert_eq!(counts.faults, 1);
        assert_eq!(sim.state().int(Register::new(2).expect("valid register")), 0);
        assert_eq!(sim.state().memory(), ArchitecturalState::default().memory());
        assert_eq!(
            sim.step(&mut NullSink),
            StepOutcome::Fault {
                index: 1,
                error: expected_error
            }
        );
    }

    #[test]
    fn issue_limit_stops_a_run_with_work_left() {
        let program = Program::new(vec![li(1, 1), li(2, 2), li(3, 3)], []).expect("valid program");
        let config = SimConfig {
            issue_limit: Some(2),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(program, ArchitecturalState::default(), config);

        let outcome = sim.run(&mut NullSink);
        assert_eq!(outcome.stop, StopReason::IssueLimit { limit: 2 });
        assert_eq!(outcome.issued, 2);
        assert_eq!(sim.next_index(), 2);
    }

    #[test]
    fn issue_limit_equal_to_program_length_still_ends_normally() {
        let program = Program::new(vec![li(1, 1), li(2, 2)], []).expect("valid program");
        let config = SimConfig {
            issue_limit: Some(2),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(program, ArchitecturalState::default(), config);

        assert_eq!(sim.run(&mut NullSink).stop, StopReason::ProgramEnd);
    }
}
