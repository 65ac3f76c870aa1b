//! # c0harness
//!
//! Test harness for a source-to-WebAssembly compiler pipeline.
//!
//! A run compiles one source file with an external compiler, instantiates
//! the resulting `<source>.wasm` against the `c0deine` host ABI, executes it
//! and reports what the guest signalled.

#![warn(missing_docs)]

pub use c0harness_wasm as wasm;

/// Error types for the harness
pub mod error;

/// Harness configuration
pub mod config;

/// External compiler invocation
pub mod compiler;

/// Terminal outcomes and console reporting
pub mod outcome;

/// The compile → instantiate → run orchestrator
pub mod harness;

pub use compiler::{CompileOutput, CompilerInvoker, ShellCompiler};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use harness::{Harness, InputKind, RunState};
pub use outcome::{ExecutionOutcome, HarnessReport};

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
