//! # c0harness WASM host
//!
//! Module loading, the `c0deine` host ABI and per-run execution for the
//! c0harness compiler test harness.

#![warn(missing_docs)]

/// Compiled artifact loading and validation
pub mod module;

/// Host ABI: linear memory plus the `result`/`abort`/`error` bindings
pub mod host;

/// NUL-terminated string decoding over guest memory
pub mod decode;

/// Per-run instantiation and execution
pub mod runtime;

/// WASM-specific error types
pub mod error;

/// Test utilities for WASM modules
pub mod test_utils;

pub use decode::decode_c0_string;
pub use error::{AbiViolation, WasmError};
pub use host::{HostAbi, HostRecord};
pub use module::{CompiledModule, ModuleMetadata, WasmImport};
pub use runtime::{Instantiated, RunFailure, WasmConfig, WasmRuntime};

/// Result type alias for WASM host operations
pub type Result<T> = std::result::Result<T, WasmError>;
