//! Program text parser.
//!
//! One instruction per line with an optional `Label:` prefix. A label alone on
//! a line marks the next instruction. Operands are comma separated and parsed
//! by the operator's signature:
//!
//! | Kind              | Form                         |
//! |-------------------|------------------------------|
//! | integer register  | `$n`                         |
//! | FP register       | `Fn`                         |
//! | immediate         | signed decimal               |
//! | memory reference  | `offset($n)` or `offset(lit)`|
//! | label             | identifier                   |

use std::collections::{BTreeMap, BTreeSet};

use pipeline_core::{
    AddressBase, Instruction, MemoryRef, OperandKind, Operand, Program, Register,
};

use crate::errors::{CliError, ParseError, ParseErrorKind};
use crate::mnemonic::resolve_mnemonic;
use crate::source::{source_lines, SourceLine};

/// A parsed program plus the source text of each instruction for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProgram {
    /// Validated program.
    pub program: Program,
    /// Instruction text as written, with its label prefix, one per index.
    pub lines: Vec<String>,
}

/// Parses program text.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse_program(content: &str) -> Result<ParsedProgram, ParseError> {
    parse_source(&source_lines(content))
}

/// Parses already-split source lines.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered, or
/// [`ParseErrorKind::DanglingLabel`] when the last label has no instruction.
pub fn parse_source(lines: &[SourceLine]) -> Result<ParsedProgram, ParseError> {
    let mut instructions = Vec::new();
    let mut texts = Vec::new();
    let mut positions: BTreeSet<usize> = BTreeSet::new();
    let mut names: BTreeMap<String, usize> = BTreeMap::new();
    let mut pending: Vec<(String, usize)> = Vec::new();
    let mut targets: Vec<(String, usize)> = Vec::new();

    for line in lines {
        let (label, rest) = split_label(&line.text, line.number)?;
        if let Some(name) = label {
            pending.push((name, line.number));
        }
        if rest.is_empty() {
            continue;
        }

        let instruction = parse_instruction(rest, line.number)?;
        let index = instructions.len();
        let mut display = String::new();
        for (name, number) in pending.drain(..) {
            if number != line.number {
                display.push_str(&name);
                display.push_str(": ");
            }
            positions.insert(index);
            if let Some(previous) = names.insert(name.clone(), index) {
                log::warn!(
                    "line {number}: label {name} repeated (also marks instruction {previous})"
                );
            }
        }
        display.push_str(&line.text);
        if let Some(Operand::Label(target)) = instruction.operands().last() {
            targets.push((target.clone(), line.number));
        }
        instructions.push(instruction);
        texts.push(display);
    }

    if let Some((name, number)) = pending.pop() {
        return Err(ParseError::new(number, ParseErrorKind::DanglingLabel(name)));
    }

    for (target, number) in &targets {
        if !names.contains_key(target) {
            log::warn!("line {number}: branch target {target} is not defined");
        }
    }

    let last_line = lines.last().map_or(0, |line| line.number);
    let program = Program::new(instructions, positions)
        .map_err(|err| ParseError::new(last_line, err.into()))?;
    log::debug!(
        "parsed {} instruction(s), {} label position(s)",
        program.len(),
        program.labels().count()
    );

    Ok(ParsedProgram {
        program,
        lines: texts,
    })
}

/// Splits an optional `Label:` prefix from the rest of the line.
fn split_label(text: &str, line: usize) -> Result<(Option<String>, &str), ParseError> {
    let Some((head, rest)) = text.split_once(':') else {
        return Ok((None, text));
    };
    let name = head.trim();
    if !is_identifier(name) {
        return Err(ParseError::new(
            line,
            ParseErrorKind::InvalidLabel(name.to_string()),
        ));
    }
    Ok((Some(name.to_string()), rest.trim()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_instruction(text: &str, line: usize) -> Result<Instruction, ParseError> {
    let (mnemonic, rest) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(m, r)| (m, r.trim()));
    let operator = resolve_mnemonic(mnemonic).ok_or_else(|| {
        ParseError::new(line, ParseErrorKind::UnknownMnemonic(mnemonic.to_string()))
    })?;

    let tokens: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };
    let signature = operator.signature();
    if tokens.len() != signature.len() {
        return Err(ParseError::new(
            line,
            ParseErrorKind::OperandCount {
                mnemonic: operator.mnemonic().to_string(),
                expected: signature.len(),
                found: tokens.len(),
            },
        ));
    }

    let operands = tokens
        .iter()
        .zip(signature)
        .map(|(token, kind)| parse_operand(token, *kind, line))
        .collect::<Result<Vec<_>, _>>()?;

    Instruction::new(operator, operands).map_err(|err| ParseError::new(line, err.into()))
}

/// Parses one operand token as the given kind.
///
/// # Errors
///
/// Returns the [`ParseErrorKind`] matching the expected kind when the token
/// does not have that form.
pub fn parse_operand(token: &str, kind: OperandKind, line: usize) -> Result<Operand, ParseError> {
    let fail = |kind: fn(String) -> ParseErrorKind| ParseError::new(line, kind(token.to_string()));
    match kind {
        OperandKind::IntRegister => parse_register(token, '$')
            .map(Operand::IntRegister)
            .ok_or_else(|| fail(ParseErrorKind::InvalidRegister)),
        OperandKind::FpRegister => parse_register(token, 'F')
            .map(Operand::FpRegister)
            .ok_or_else(|| fail(ParseErrorKind::InvalidRegister)),
        OperandKind::Immediate => token
            .parse::<i32>()
            .map(Operand::Immediate)
            .map_err(|_| fail(ParseErrorKind::InvalidImmediate)),
        OperandKind::Address => parse_memory_ref(token)
            .map(Operand::Address)
            .ok_or_else(|| fail(ParseErrorKind::InvalidAddress)),
        OperandKind::Label => {
            if is_identifier(token) {
                Ok(Operand::Label(token.to_string()))
            } else {
                Err(fail(ParseErrorKind::InvalidLabel))
            }
        }
    }
}

fn parse_register(token: &str, prefix: char) -> Option<Register> {
    let digits = token
        .strip_prefix(prefix)
        .or_else(|| token.strip_prefix(prefix.to_ascii_lowercase()))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().and_then(|n| Register::new(n).ok())
}

fn parse_memory_ref(token: &str) -> Option<MemoryRef> {
    let (offset, base) = token.strip_suffix(')')?.split_once('(')?;
    let offset = match offset.trim() {
        "" => 0,
        text => text.parse::<i32>().ok()?,
    };
    let base = base.trim();
    let base = if base.starts_with('$') {
        AddressBase::Register(parse_register(base, '$')?)
    } else {
        AddressBase::Literal(base.parse::<i32>().ok()?)
    };
    Some(MemoryRef { offset, base })
}

/// Parses a comma-separated memory image such as `45,12,0,92`.
///
/// # Errors
///
/// Returns [`CliError::Usage`] for an empty image or a non-integer word.
pub fn parse_memory_image(text: &str) -> Result<Vec<i32>, CliError> {
    if text.trim().is_empty() {
        return Err(CliError::Usage("memory image is empty".to_string()));
    }
    text.split(',')
        .map(str::trim)
        .map(|word| {
            word.parse::<i32>()
                .map_err(|_| CliError::Usage(format!("invalid memory word: {word}")))
        })
        .collect()
}
