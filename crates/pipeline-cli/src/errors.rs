//! Error types for program parsing and the command line.
//!
//! Parse errors carry the 1-based source line they were raised on so they
//! format as `line 7: unknown mnemonic: MULT`.

use pipeline_core::ProgramError;
use thiserror::Error;

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Mnemonic not in the operator table.
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),
    /// Register token that is malformed or outside `0..32`.
    #[error("invalid register: {0}")]
    InvalidRegister(String),
    /// Immediate that is not a signed 32-bit decimal.
    #[error("invalid immediate value: {0}")]
    InvalidImmediate(String),
    /// Memory reference not of the form `offset(base)`.
    #[error("invalid memory reference: {0}")]
    InvalidAddress(String),
    /// Label that is not an identifier.
    #[error("invalid label: {0}")]
    InvalidLabel(String),
    /// Operand count differs from the operator's signature.
    #[error("{mnemonic} takes {expected} operand(s), found {found}")]
    OperandCount {
        /// Mnemonic as written.
        mnemonic: String,
        /// Operands the signature requires.
        expected: usize,
        /// Operands supplied.
        found: usize,
    },
    /// Label with no instruction after it.
    #[error("label {0} is not followed by an instruction")]
    DanglingLabel(String),
    /// Instruction or program rejected by the core model.
    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// A parse error with its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    /// Kind of parse error.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a parse error for `line`.
    #[must_use]
    pub const fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Failures surfaced by the `mcpipe` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Program file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path as given on the command line.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Program text did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Bad command-line usage.
    #[error("{0}")]
    Usage(String),
    /// JSON report could not be encoded.
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}
