//! Front end for the multicycle pipeline simulator: program text parsing,
//! pipeline diagrams and final-state reports used by the `mcpipe` binary.

/// Error types for parsing and the command line.
pub mod errors;
pub use errors::{CliError, ParseError, ParseErrorKind};

/// Source reading and comment stripping.
pub mod source;
pub use source::{read_source, source_lines, SourceLine};

/// Case-insensitive mnemonic lookup.
pub mod mnemonic;
pub use mnemonic::resolve_mnemonic;

/// Program text parser.
pub mod parser;
pub use parser::{parse_memory_image, parse_program, parse_source, ParsedProgram};

/// Cycle-by-cycle pipeline diagram.
pub mod diagram;
pub use diagram::{DiagramRecorder, DiagramRow, DEFAULT_DIAGRAM_ROWS};

/// Final-state and run-summary reports.
pub mod report;
pub use report::{render_json, render_summary, render_text};

use env_logger as _;
#[cfg(test)]
use tempfile as _;
