//! Terminal outcomes and their console report

use crate::error::HarnessError;
use c0harness_wasm::HostRecord;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Prefix for an `abort` signal line
pub const ABORT_MARKER: &str = "abort: ";

/// Prefix for each diagnostic line
pub const ERROR_MARKER: &str = "error:  ";

/// Closing line of a failed compilation
pub const COMPILE_FAILED_LINE: &str = "Compilation failed.";

/// Terminal state of one compile → instantiate → run sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The compiler failed; nothing was loaded
    CompileFailed {
        /// Compiler exit code, if it exited at all
        exit_code: Option<i32>,
        /// Compiler standard output
        stdout: String,
        /// Compiler standard error, or the spawn failure
        stderr: String,
    },
    /// The artifact could not be loaded, linked or started
    InstantiateFailed {
        /// Failure message
        message: String,
        /// Code passed to `result` before the failure
        result: Option<i32>,
        /// Signal passed to `abort` before the failure
        abort: Option<i32>,
        /// Lines the guest logged before failing
        diagnostics: Vec<String>,
    },
    /// The module ran to completion
    Completed(HostRecord),
}

impl ExecutionOutcome {
    /// Write the console report for this outcome
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            ExecutionOutcome::CompileFailed { stdout, stderr, .. } => {
                writeln!(out, "{}", stdout)?;
                writeln!(out, "{}", stderr)?;
                writeln!(out, "{}", COMPILE_FAILED_LINE)
            }
            ExecutionOutcome::InstantiateFailed { message, result, abort, diagnostics } => {
                write_signals(out, *result, *abort, diagnostics)?;
                writeln!(out, "{}", message)
            }
            ExecutionOutcome::Completed(record) => {
                write_signals(out, record.result, record.abort, &record.diagnostics)
            }
        }
    }
}

/// Result or abort line, then each diagnostic in call order
fn write_signals<W: Write>(
    out: &mut W,
    result: Option<i32>,
    abort: Option<i32>,
    diagnostics: &[String],
) -> io::Result<()> {
    if let Some(code) = result {
        writeln!(out, "{}", code)?;
    }
    if let Some(signal) = abort {
        writeln!(out, "{}{}", ABORT_MARKER, signal)?;
    }
    for line in diagnostics {
        writeln!(out, "{}{}", ERROR_MARKER, line)?;
    }
    Ok(())
}

/// Everything a single harness invocation can end with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HarnessReport {
    /// Source path does not exist
    InputNotFound {
        /// The path as given
        path: PathBuf,
    },
    /// Source path exists but is not a regular file; nothing was done
    NotAFile {
        /// The path as given
        path: PathBuf,
    },
    /// The source went through the pipeline
    Ran {
        /// How it ended
        outcome: ExecutionOutcome,
    },
}

impl HarnessReport {
    /// Write the console report
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            HarnessReport::InputNotFound { path } => {
                writeln!(out, "{}", HarnessError::InputNotFound(path.clone()))
            }
            HarnessReport::NotAFile { .. } => Ok(()),
            HarnessReport::Ran { outcome } => outcome.write_report(out),
        }
    }

    /// Write the report as a single JSON line
    pub fn write_json<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer(&mut *out, self)?;
        writeln!(out)
    }

    /// The execution outcome, if the pipeline ran
    pub fn outcome(&self) -> Option<&ExecutionOutcome> {
        match self {
            HarnessReport::Ran { outcome } => Some(outcome),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &HarnessReport) -> String {
        let mut out = Vec::new();
        report.write_report(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn ran(outcome: ExecutionOutcome) -> HarnessReport {
        HarnessReport::Ran { outcome }
    }

    #[test]
    fn test_input_not_found_line() {
        let report = HarnessReport::InputNotFound { path: PathBuf::from("nope.c0") };
        assert_eq!(render(&report), "Couldn't find file: nope.c0\n");
    }

    #[test]
    fn test_not_a_file_prints_nothing() {
        let report = HarnessReport::NotAFile { path: PathBuf::from("dir") };
        assert_eq!(render(&report), "");
    }

    #[test]
    fn test_compile_failed_echoes_output() {
        let report = ran(ExecutionOutcome::CompileFailed {
            exit_code: Some(1),
            stdout: "out".to_string(),
            stderr: "parse error".to_string(),
        });
        assert_eq!(render(&report), "out\nparse error\nCompilation failed.\n");
    }

    #[test]
    fn test_completed_result_then_diagnostics() {
        let report = ran(ExecutionOutcome::Completed(HostRecord {
            result: Some(42),
            abort: None,
            diagnostics: vec!["Hi".to_string(), "there".to_string()],
        }));
        assert_eq!(render(&report), "42\nerror:  Hi\nerror:  there\n");
    }

    #[test]
    fn test_completed_abort() {
        let report = ran(ExecutionOutcome::Completed(HostRecord {
            result: None,
            abort: Some(7),
            diagnostics: vec![],
        }));
        assert_eq!(render(&report), "abort: 7\n");
    }

    #[test]
    fn test_completed_without_outcome() {
        let report = ran(ExecutionOutcome::Completed(HostRecord::default()));
        assert_eq!(render(&report), "");
    }

    #[test]
    fn test_instantiate_failed_keeps_diagnostics_first() {
        let report = ran(ExecutionOutcome::InstantiateFailed {
            message: "wasm trap".to_string(),
            result: None,
            abort: None,
            diagnostics: vec!["before".to_string()],
        });
        assert_eq!(render(&report), "error:  before\nwasm trap\n");
    }

    #[test]
    fn test_instantiate_failed_keeps_result_first() {
        let report = ran(ExecutionOutcome::InstantiateFailed {
            message: "wasm trap".to_string(),
            result: Some(3),
            abort: None,
            diagnostics: vec!["before".to_string()],
        });
        assert_eq!(render(&report), "3\nerror:  before\nwasm trap\n");
    }

    #[test]
    fn test_json_report() {
        let report = ran(ExecutionOutcome::Completed(HostRecord {
            result: Some(42),
            abort: None,
            diagnostics: vec!["Hi".to_string()],
        }));
        let mut out = Vec::new();
        report.write_json(&mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "ran");
        assert_eq!(value["outcome"]["outcome"], "completed");
        assert_eq!(value["outcome"]["result"], 42);
        assert!(value["outcome"]["abort"].is_null());
        assert_eq!(value["outcome"]["diagnostics"][0], "Hi");
    }
}
