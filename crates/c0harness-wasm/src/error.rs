//! WASM-specific error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or instantiating a compiled artifact
#[derive(Debug, Error)]
pub enum WasmError {
    /// The compiled artifact does not exist
    #[error("Compiled artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// The artifact bytes are not a valid module
    #[error("Malformed module binary: {0}")]
    MalformedBinary(String),

    /// Linking, start-up or entry point failure
    #[error("{0}")]
    Instantiation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wasmtime error
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// A guest broke the host ABI contract.
///
/// Raised from inside a host binding, so it reaches the embedder as the
/// source of a trap and can be recovered with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ABI violation: `{call}` called after `{previous}` already fired")]
pub struct AbiViolation {
    /// Binding that was called
    pub call: &'static str,
    /// Binding that had already recorded an outcome
    pub previous: &'static str,
}
