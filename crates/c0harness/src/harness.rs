//! Execution orchestration: compile → instantiate → run → report

use crate::compiler::{CompilerInvoker, ShellCompiler};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::outcome::{ExecutionOutcome, HarnessReport};
use crate::Result;
use c0harness_wasm::{CompiledModule, RunFailure, WasmRuntime};
use std::fs;
use std::path::Path;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What the source path points at. A symlink to a file is not a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Nothing there
    Missing,
    /// Exists but is not a regular file
    NotAFile,
    /// A regular file
    File,
}

impl InputKind {
    /// Inspect `path`
    pub fn classify(path: &Path) -> Self {
        // Existence follows links, so a dangling symlink counts as missing
        if fs::metadata(path).is_err() {
            return InputKind::Missing;
        }
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_file() => InputKind::File,
            Ok(_) => InputKind::NotAFile,
            Err(_) => InputKind::Missing,
        }
    }
}

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started
    Idle,
    /// Waiting on the compiler
    Compiling,
    /// Loading and instantiating the artifact
    Instantiating,
    /// Guest code running
    Running,
    /// Terminal: compiler failed
    CompileFailed,
    /// Terminal: artifact could not be loaded or started
    InstantiateFailed,
    /// Terminal: guest ran to completion
    Completed,
}

impl RunState {
    /// Whether this state ends the run
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::CompileFailed | RunState::InstantiateFailed | RunState::Completed
        )
    }
}

/// Drives one source file through the pipeline
pub struct Harness<C = ShellCompiler> {
    compiler: C,
    runtime: WasmRuntime,
}

impl Harness<ShellCompiler> {
    /// Build a harness that shells out to the configured compiler
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        let compiler = ShellCompiler::new(&config.compiler)?;
        let runtime = WasmRuntime::with_config(config.wasm.clone())?;
        Ok(Self::new(compiler, runtime))
    }
}

impl<C: CompilerInvoker> Harness<C> {
    /// Create a harness from its parts
    pub fn new(compiler: C, runtime: WasmRuntime) -> Self {
        Self { compiler, runtime }
    }

    /// Check the input path, then run it if it is a regular file
    pub async fn run(&self, path: &Path) -> HarnessReport {
        match InputKind::classify(path) {
            InputKind::Missing => {
                info!("Input not found: {}", path.display());
                HarnessReport::InputNotFound { path: path.to_path_buf() }
            }
            InputKind::NotAFile => {
                debug!("Input is not a regular file, nothing to do: {}", path.display());
                HarnessReport::NotAFile { path: path.to_path_buf() }
            }
            InputKind::File => HarnessReport::Ran {
                outcome: self.run_source(path).await,
            },
        }
    }

    /// Compile, instantiate and run `source`, classifying how it ended
    pub async fn run_source(&self, source: &Path) -> ExecutionOutcome {
        let span = info_span!("run", id = %Uuid::new_v4(), source = %source.display());
        self.drive(source).instrument(span).await
    }

    async fn drive(&self, source: &Path) -> ExecutionOutcome {
        let mut state = RunState::Idle;

        transition(&mut state, RunState::Compiling);
        // The loader is not touched until the compiler has fully resolved
        match self.compiler.compile(source).await {
            Ok(output) if output.success() => {
                info!(duration_ms = output.duration_ms, "Compilation succeeded");
            }
            Ok(output) => {
                transition(&mut state, RunState::CompileFailed);
                warn!(exit_code = ?output.exit_code, "Compiler exited unsuccessfully");
                return ExecutionOutcome::CompileFailed {
                    exit_code: output.exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
            }
            Err(e) => {
                transition(&mut state, RunState::CompileFailed);
                warn!("Compiler invocation failed: {}", e);
                // The report adds its own "Compilation failed." line
                let stderr = match e {
                    HarnessError::CompileFailure(message) => message,
                    other => other.to_string(),
                };
                return ExecutionOutcome::CompileFailed {
                    exit_code: None,
                    stdout: String::new(),
                    stderr,
                };
            }
        }

        transition(&mut state, RunState::Instantiating);
        let artifact = CompiledModule::artifact_path(source);
        let instantiated = self
            .runtime
            .load(&artifact)
            .map_err(RunFailure::from)
            .and_then(|module| {
                debug!(hash = %module.hash(), size = module.metadata.size, "Loaded artifact");
                self.runtime.instantiate(&module)
            });
        let instantiated = match instantiated {
            Ok(instantiated) => instantiated,
            Err(failure) => return instantiate_failed(&mut state, failure),
        };

        transition(&mut state, RunState::Running);
        match instantiated.execute() {
            Ok(record) => {
                transition(&mut state, RunState::Completed);
                info!(result = ?record.result, abort = ?record.abort, "Run completed");
                ExecutionOutcome::Completed(record)
            }
            Err(failure) => instantiate_failed(&mut state, failure),
        }
    }
}

fn instantiate_failed(state: &mut RunState, failure: RunFailure) -> ExecutionOutcome {
    transition(state, RunState::InstantiateFailed);
    warn!("Instantiation failed: {}", failure);
    ExecutionOutcome::InstantiateFailed {
        message: failure.to_string(),
        result: failure.record.result,
        abort: failure.record.abort,
        diagnostics: failure.record.diagnostics,
    }
}

fn transition(state: &mut RunState, next: RunState) {
    debug_assert!(!state.is_terminal(), "transition out of terminal state {:?}", state);
    debug!("{:?} -> {:?}", state, next);
    *state = next;
}
