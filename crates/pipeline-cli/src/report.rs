//! Final-state and run-summary reporting.

use std::fmt::Write as _;

use pipeline_core::{ArchitecturalState, FaultClass, RunOutcome, StopReason, TraceEntry};
use serde::Serialize;

use crate::diagram::DiagramRecorder;

/// Renders registers and memory as text.
#[must_use]
pub fn render_text(state: &ArchitecturalState) -> String {
    let mut out = String::from("Final values in float registers:\n");
    for (n, value) in state.fp_registers().as_slice().iter().enumerate() {
        let _ = writeln!(out, "F{n} -> {value:?}");
    }
    out.push_str("\nFinal values in int registers:\n");
    for (n, value) in state.int_registers().as_slice().iter().enumerate() {
        let _ = writeln!(out, "${n} -> {value}");
    }
    out.push_str("\nFinal values in memory:\n");
    for (address, value) in state.memory().iter().enumerate() {
        let _ = writeln!(out, "Address {address} -> {value}");
    }
    out
}

/// One-line summary of why and where a run stopped.
#[must_use]
pub fn render_summary(outcome: &RunOutcome) -> String {
    let stop = match &outcome.stop {
        StopReason::ProgramEnd => "program end".to_string(),
        StopReason::IssueLimit { limit } => format!("issue limit of {limit} reached"),
        StopReason::Fault { index, error } => {
            format!("{} fault at instruction {index}: {error}", error.class())
        }
    };
    format!(
        "Issued {} instruction(s) in {} cycle(s); stopped at {stop}",
        outcome.issued, outcome.total_cycles
    )
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a RunOutcome,
    fault_class: Option<FaultClass>,
    int_registers: &'a [i32],
    fp_registers: &'a [f32],
    memory: &'a [i32],
    rows_omitted: usize,
    rows: Vec<ReportRow<'a>>,
}

#[derive(Serialize)]
struct ReportRow<'a> {
    index: usize,
    instruction: &'a str,
    start: usize,
    entries: &'a [TraceEntry],
}

/// Renders the run summary, final state and kept diagram rows as pretty JSON.
///
/// # Errors
///
/// Returns the `serde_json` error if encoding fails.
pub fn render_json(
    outcome: &RunOutcome,
    state: &ArchitecturalState,
    diagram: &DiagramRecorder,
    lines: &[String],
) -> Result<String, serde_json::Error> {
    let fault_class = match &outcome.stop {
        StopReason::Fault { error, .. } => Some(error.class()),
        StopReason::ProgramEnd | StopReason::IssueLimit { .. } => None,
    };
    let report = Report {
        outcome,
        fault_class,
        int_registers: state.int_registers().as_slice(),
        fp_registers: state.fp_registers().as_slice(),
        memory: state.memory(),
        rows_omitted: diagram.omitted(),
        rows: diagram
            .rows()
            .map(|row| ReportRow {
                index: row.index,
                instruction: lines.get(row.index).map_or("", String::as_str),
                start: row.start,
                entries: &row.entries,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}
