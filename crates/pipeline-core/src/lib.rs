//! Core crate for the multicycle pipeline simulator.
//!
//! Each instruction is walked through `IF`, `ID`, an execute unit, the memory
//! stage(s) and `WB`, one cycle at a time. Structural hazards are detected by
//! comparing the instruction's position against the trace of the instruction
//! issued just before it.

/// Pipeline stage model and floating-point functional units.
pub mod stage;
pub use stage::{FpSlot, FpUnit, Stage, STAGE_COUNT};

/// Operator table: mnemonics, execution classes and operand signatures.
pub mod operator;
pub use operator::{ExecClass, OperandKind, Operator, OperatorInfo, OPERATOR_TABLE};

/// Uncontended latency per execution class.
pub mod timing;
pub use timing::{execute_cycles, uncontended_cycles, EXECUTE_CYCLES_TABLE, FRONT_END_CYCLES};

/// Runtime fault taxonomy.
pub mod fault;
pub use fault::{FaultClass, SimError};

/// Data memory image and access policy.
pub mod memory;
pub use memory::{default_memory, resolve_index, AccessPolicy, DEFAULT_MEMORY_IMAGE};

/// Architectural register files and memory.
pub mod state;
pub use state::{ArchitecturalState, Register, RegisterError, RegisterFile, REGISTER_COUNT};

/// Instructions, operands and programs.
pub mod program;
pub use program::{AddressBase, Instruction, MemoryRef, Operand, Program, ProgramError};

/// Predecessor-relative hazard checks.
pub mod hazard;
pub use hazard::PredecessorView;

/// Stage transition engine.
pub mod transition;
pub use transition::{next_stage, Transition};

/// Cycle traces and the trace recorder.
pub mod trace;
pub use trace::{Committed, Trace, TraceEntry, TraceRecorder};

/// Architectural effects of non-branch instructions.
pub mod execute;
pub use execute::{apply_effect, plan_effect, round_half_up, Effect};

/// Branch outcome and next-index resolution.
pub mod branch;
pub use branch::{branch_taken, next_index};

/// Host-facing configuration, outcomes and event sink contract.
pub mod api;
pub use api::{
    NullSink, RunOutcome, SimConfig, SimEvent, StepOutcome, StopReason, TraceSink,
    DEFAULT_ISSUE_LIMIT,
};

/// Instruction-by-instruction driver.
pub mod sim;
pub use sim::Simulator;

#[cfg(test)]
use proptest as _;
