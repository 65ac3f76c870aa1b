//! External compiler invocation

use crate::error::HarnessError;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: Bytes,
    /// Captured standard error
    pub stderr: Bytes,
    /// Wall time of the invocation
    pub duration_ms: u64,
}

impl CompileOutput {
    /// Whether the compiler reported success
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that turns a source file into `<source>.wasm`
#[async_trait]
pub trait CompilerInvoker: Send + Sync {
    /// Compile `source`. `Err` means the compiler could not be run at all;
    /// a compiler that ran and failed returns `Ok` with a non-zero exit code.
    async fn compile(&self, source: &Path) -> Result<CompileOutput>;
}

/// Runs a compiler command as a subprocess, appending the source path
#[derive(Debug, Clone)]
pub struct ShellCompiler {
    program: String,
    args: Vec<String>,
}

impl ShellCompiler {
    /// Build from a command line: program followed by leading arguments
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| HarnessError::Config("empty compiler command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl CompilerInvoker for ShellCompiler {
    async fn compile(&self, source: &Path) -> Result<CompileOutput> {
        debug!("Running compiler: {} {:?} {}", self.program, self.args, source.display());

        let start_time = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                HarnessError::CompileFailure(format!("failed to spawn {}: {}", self.program, e))
            })?;

        let duration = start_time.elapsed();

        Ok(CompileOutput {
            exit_code: output.status.code(),
            stdout: Bytes::from(output.stdout),
            stderr: Bytes::from(output.stderr),
            duration_ms: duration.as_millis() as u64,
        })
    }
}
