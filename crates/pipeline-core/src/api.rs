use crate::execute::Effect;
use crate::memory::AccessPolicy;
use crate::program::Instruction;
use crate::trace::Trace;
use crate::SimError;

/// Default cap on issued instructions, which bounds runs that loop forever.
pub const DEFAULT_ISSUE_LIMIT: u64 = 4096;

/// Simulator configuration contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Out-of-range memory handling.
    pub access_policy: AccessPolicy,
    /// Maximum instructions issued before `run` stops; `None` for unbounded.
    pub issue_limit: Option<u64>,
    /// Enables event dispatch to the sink.
    pub events_enabled: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            access_policy: AccessPolicy::Strict,
            issue_limit: Some(DEFAULT_ISSUE_LIMIT),
            events_enabled: true,
        }
    }
}

/// Result of issuing a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction left the pipeline.
    Retired {
        /// Program index of the instruction.
        index: usize,
        /// Index issued next.
        next_index: usize,
        /// Length of the recorded trace.
        cycles: usize,
        /// Stalled cycles in the trace.
        stalls: usize,
    },
    /// No instruction left to issue.
    Finished,
    /// Effect application faulted; the run cannot continue.
    Fault {
        /// Program index of the faulting instruction.
        index: usize,
        /// Fault raised.
        error: SimError,
    },
}

/// Why `run` returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StopReason {
    /// The next index fell past the last instruction.
    ProgramEnd,
    /// The configured issue limit was reached.
    IssueLimit {
        /// Limit in force.
        limit: u64,
    },
    /// An instruction faulted.
    Fault {
        /// Program index of the faulting instruction.
        index: usize,
        /// Fault raised.
        error: SimError,
    },
}

/// Aggregated outcome of a `run` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Instructions issued during this call.
    pub issued: u64,
    /// Global cycle at which the last completed instruction left the pipeline.
    pub total_cycles: usize,
    /// Stop condition.
    pub stop: StopReason,
}

/// Observation emitted while simulating, in execution order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent<'a> {
    /// An instruction entered the pipeline.
    Issued {
        /// Program index.
        index: usize,
        /// Instruction issued.
        instruction: &'a Instruction,
    },
    /// An effect reached architectural state.
    EffectCommitted {
        /// Program index.
        index: usize,
        /// Global cycle of the commit stage.
        cycle: usize,
        /// Effect applied.
        effect: Effect,
    },
    /// An instruction's trace is complete.
    TraceCompleted {
        /// Program index.
        index: usize,
        /// Completed trace.
        trace: &'a Trace,
    },
    /// A branch was resolved.
    BranchResolved {
        /// Program index of the branch.
        index: usize,
        /// Whether control transferred.
        taken: bool,
        /// Index issued next.
        next_index: usize,
    },
    /// An instruction faulted.
    Faulted {
        /// Program index.
        index: usize,
        /// Fault raised.
        error: &'a SimError,
    },
}

/// Receiver for simulator events.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: SimEvent<'_>);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: SimEvent<'_>) {}
}
