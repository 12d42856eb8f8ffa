//! CLI entry point for the multicycle pipeline simulator.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use log as _;
use pipeline_cli::{
    parse_memory_image, parse_source, read_source, render_json, render_summary, render_text,
    CliError, DiagramRecorder, DEFAULT_DIAGRAM_ROWS,
};
use pipeline_core::{
    default_memory, AccessPolicy, ArchitecturalState, SimConfig, Simulator, StopReason,
    DEFAULT_ISSUE_LIMIT,
};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: mcpipe <command> [options]

Commands:
  run <program>  Simulate a program and print its pipeline diagram and final state

Options:
  --memory <w,w,...>   Initial memory image (default: built-in 19-word image)
  --issue-limit <n>    Stop after issuing n instructions (default: 4096)
  --no-issue-limit     Run until the program ends
  --lenient            Read 0 and drop writes for out-of-range addresses
  --format <fmt>       Output format: text or json (default: text)
  --no-diagram         Omit the pipeline diagram from text output
  --diagram-rows <n>   Keep only the last n diagram rows, or `all` (default: 64)
  -v, --verbose        Log each issue and commit to stderr
  -h, --help           Show this help message

Examples:
  mcpipe run loop.s
  mcpipe run loop.s --issue-limit 20 --format json
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    program: PathBuf,
    memory: Option<Vec<i32>>,
    issue_limit: Option<u64>,
    lenient: bool,
    format: Format,
    diagram: bool,
    diagram_rows: Option<usize>,
    verbose: bool,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args).map(ParseResult::Run),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut program: Option<PathBuf> = None;
    let mut memory: Option<Vec<i32>> = None;
    let mut issue_limit = Some(DEFAULT_ISSUE_LIMIT);
    let mut lenient = false;
    let mut format = Format::Text;
    let mut diagram = true;
    let mut diagram_rows = Some(DEFAULT_DIAGRAM_ROWS);
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "--lenient" {
            lenient = true;
            continue;
        }

        if arg == "--no-diagram" {
            diagram = false;
            continue;
        }

        if arg == "--no-issue-limit" {
            issue_limit = None;
            continue;
        }

        if arg == "--issue-limit" {
            let value = next_value(&mut args, "--issue-limit")?;
            let limit = value
                .parse::<u64>()
                .map_err(|_| format!("invalid issue limit: {value}"))?;
            issue_limit = Some(limit);
            continue;
        }

        if arg == "--diagram-rows" {
            let value = next_value(&mut args, "--diagram-rows")?;
            diagram_rows = if value == "all" {
                None
            } else {
                Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("invalid diagram row count: {value}"))?,
                )
            };
            continue;
        }

        if arg == "--memory" {
            let value = next_value(&mut args, "--memory")?;
            memory = Some(parse_memory_image(&value).map_err(|e| e.to_string())?);
            continue;
        }

        if arg == "--format" {
            let value = next_value(&mut args, "--format")?;
            format = match value.as_str() {
                "text" => Format::Text,
                "json" => Format::Json,
                other => return Err(format!("unknown format: {other}")),
            };
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if program.is_some() {
            return Err("multiple program paths provided".to_string());
        }
        program = Some(PathBuf::from(arg));
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(RunArgs {
        program,
        memory,
        issue_limit,
        lenient,
        format,
        diagram,
        diagram_rows,
        verbose,
    })
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn run(args: RunArgs) -> Result<i32, CliError> {
    let lines = read_source(&args.program)?;
    let parsed = parse_source(&lines)?;

    let state = ArchitecturalState::with_memory(args.memory.unwrap_or_else(default_memory));
    let config = SimConfig {
        access_policy: if args.lenient {
            AccessPolicy::Lenient
        } else {
            AccessPolicy::Strict
        },
        issue_limit: args.issue_limit,
        events_enabled: true,
    };

    let mut recorder = DiagramRecorder::with_row_limit(args.diagram_rows);
    let mut simulator = Simulator::new(parsed.program, state, config);
    let outcome = simulator.run(&mut recorder);
    let state = simulator.into_state();

    match args.format {
        Format::Text => {
            if args.diagram {
                println!("{}", recorder.render(&parsed.lines));
            }
            println!("{}", render_summary(&outcome));
            println!();
            print!("{}", render_text(&state));
        }
        Format::Json => {
            println!(
                "{}",
                render_json(&outcome, &state, &recorder, &parsed.lines)?
            );
        }
    }

    Ok(match outcome.stop {
        StopReason::ProgramEnd => 0,
        StopReason::IssueLimit { limit } => {
            eprintln!("error: issue limit of {limit} reached before the program ended");
            1
        }
        StopReason::Fault { index, error } => {
            eprintln!("error: instruction {index} faulted: {error}");
            1
        }
    })
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => {
            init_logger(args.verbose);
            match run(args) {
                Ok(code) => code,
                Err(error) => {
                    eprintln!("error: {error}");
                    1
                }
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os<'a>(args: &'a [&'a str]) -> impl Iterator<Item = OsString> + 'a {
        args.iter().map(OsString::from)
    }

    #[test]
    fn parses_run_with_defaults() {
        let result = parse_run_args(os(&["loop.s"])).expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                program: PathBuf::from("loop.s"),
                memory: None,
                issue_limit: Some(DEFAULT_ISSUE_LIMIT),
                lenient: false,
                format: Format::Text,
                diagram: true,
                diagram_rows: Some(DEFAULT_DIAGRAM_ROWS),
                verbose: false,
            }
        );
    }

    #[test]
    fn parses_every_option() {
        let result = parse_run_args(os(&[
            "--memory",
            "1,2,3",
            "loop.s",
            "--issue-limit",
            "12",
            "--lenient",
            "--format",
            "json",
            "--no-diagram",
            "--diagram-rows",
            "8",
            "-v",
        ]))
        .expect("all options should parse");

        assert_eq!(
            result,
            RunArgs {
                program: PathBuf::from("loop.s"),
                memory: Some(vec![1, 2, 3]),
                issue_limit: Some(12),
                lenient: true,
                format: Format::Json,
                diagram: false,
                diagram_rows: Some(8),
                verbose: true,
            }
        );
    }

    #[test]
    fn no_issue_limit_clears_the_default() {
        let result =
            parse_run_args(os(&["loop.s", "--no-issue-limit"])).expect("flag should parse");
        assert_eq!(result.issue_limit, None);
    }

    #[test]
    fn diagram_rows_accepts_all() {
        let result = parse_run_args(os(&["loop.s", "--diagram-rows", "all"]))
            .expect("all should parse");
        assert_eq!(result.diagram_rows, None);

        let error = parse_run_args(os(&["loop.s", "--diagram-rows", "-3"]))
            .expect_err("negative count should fail");
        assert!(error.contains("invalid diagram row count"));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["build"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_bad_option_values() {
        let error = parse_run_args(os(&["loop.s", "--issue-limit", "many"]))
            .expect_err("non-numeric limit should fail");
        assert!(error.contains("invalid issue limit"));

        let error = parse_run_args(os(&["loop.s", "--format", "xml"]))
            .expect_err("unknown format should fail");
        assert!(error.contains("unknown format"));

        let error = parse_run_args(os(&["loop.s", "--memory", "1,x"]))
            .expect_err("bad memory word should fail");
        assert!(error.contains("invalid memory word"));

        let error =
            parse_run_args(os(&["loop.s", "--memory"])).expect_err("missing value should fail");
        assert!(error.contains("missing value for --memory"));
    }

    #[test]
    fn parse_run_missing_program() {
        let error = parse_run_args(std::iter::empty()).expect_err("missing program should fail");
        assert!(error.contains("missing program"));
    }

    #[test]
    fn parse_run_rejects_second_program() {
        let error =
            parse_run_args(os(&["a.s", "b.s"])).expect_err("two programs should fail parse");
        assert!(error.contains("multiple program paths"));
    }

    #[test]
    fn parse_run_rejects_unknown_option() {
        let error = parse_run_args(os(&["a.s", "--trace"])).expect_err("unknown option");
        assert!(error.contains("unknown option: --trace"));
    }
}
