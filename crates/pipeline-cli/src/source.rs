//! Source ingestion: numbered lines with comments removed.

use std::fs;
use std::path::Path;

use crate::errors::CliError;

/// Comment marker; the rest of the line is ignored.
pub const COMMENT_MARKER: char = ';';

/// A non-blank line of program text with its original location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Text with the comment and surrounding whitespace removed.
    pub text: String,
    /// 1-indexed line number in the original file.
    pub number: usize,
}

/// Splits `content` into numbered lines, dropping comments and blank lines.
#[must_use]
pub fn source_lines(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let code = line
                .split_once(COMMENT_MARKER)
                .map_or(line, |(code, _)| code)
                .trim();
            (!code.is_empty()).then(|| SourceLine {
                text: code.to_string(),
                number: idx + 1,
            })
        })
        .collect()
}

/// Reads and splits a program file.
///
/// # Errors
///
/// Returns [`CliError::Io`] when the file cannot be read.
pub fn read_source(path: &Path) -> Result<Vec<SourceLine>, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(source_lines(&content))
}
