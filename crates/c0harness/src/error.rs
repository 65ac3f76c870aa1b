//! Error types for the harness

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Source path does not exist
    #[error("Couldn't find file: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The compiler could not be started or exited unsuccessfully
    #[error("Compilation failed: {0}")]
    CompileFailure(String),

    /// Invalid harness configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Loading or running the compiled module failed
    #[error(transparent)]
    Wasm(#[from] c0harness_wasm::WasmError),
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {}", err))
    }
}
