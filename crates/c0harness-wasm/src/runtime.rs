//! Per-run instantiation and execution

use crate::error::{AbiViolation, WasmError};
use crate::host::{HostAbi, HostRecord};
use crate::module::CompiledModule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use wasmtime::{Engine, Instance, MemoryType, Store};

/// Size of one linear memory page
pub const WASM_PAGE_SIZE: usize = 64 * 1024;

/// Configuration for module execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasmConfig {
    /// Import namespace holding the ABI (default: "c0deine")
    pub namespace: String,
    /// Initial linear memory size in pages (default: 1)
    pub initial_memory_pages: u32,
    /// Maximum linear memory size in pages, unbounded when `None`
    pub max_memory_pages: Option<u32>,
    /// Maximum native stack used by guest code (default: 1MB)
    pub max_wasm_stack: usize,
    /// Nullary export to call after instantiation. When unset the module's
    /// start function is the whole program.
    pub entry_point: Option<String>,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            namespace: "c0deine".to_string(),
            initial_memory_pages: 1,
            max_memory_pages: None,
            max_wasm_stack: 1024 * 1024,
            entry_point: None,
        }
    }
}

impl WasmConfig {
    /// Set the import namespace
    pub fn with_namespace<S: Into<String>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the entry export
    pub fn with_entry_point<S: Into<String>>(mut self, entry: S) -> Self {
        self.entry_point = Some(entry.into());
        self
    }

    fn memory_type(&self) -> MemoryType {
        MemoryType::new(self.initial_memory_pages, self.max_memory_pages)
    }
}

/// A run that stopped before the guest finished.
///
/// Carries whatever the guest reported before the failure so it can still
/// be shown.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    /// What went wrong
    pub error: WasmError,
    /// Host record at the time of failure
    pub record: HostRecord,
}

impl RunFailure {
    fn new(error: WasmError, record: HostRecord) -> Self {
        Self { error, record }
    }
}

impl From<WasmError> for RunFailure {
    fn from(error: WasmError) -> Self {
        Self::new(error, HostRecord::default())
    }
}

/// WASM execution runtime with wasmtime integration
pub struct WasmRuntime {
    /// Wasmtime engine
    engine: Engine,
    /// Runtime configuration
    config: WasmConfig,
}

impl WasmRuntime {
    /// Create a new WASM runtime with default configuration
    pub fn new() -> Result<Self, WasmError> {
        Self::with_config(WasmConfig::default())
    }

    /// Create a new WASM runtime with custom configuration
    pub fn with_config(config: WasmConfig) -> Result<Self, WasmError> {
        let mut wasmtime_config = wasmtime::Config::new();
        wasmtime_config.max_wasm_stack(config.max_wasm_stack);

        let engine = Engine::new(&wasmtime_config)?;

        Ok(WasmRuntime { engine, config })
    }

    /// Load a compiled artifact with this runtime's engine
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<CompiledModule, WasmError> {
        CompiledModule::load(&self.engine, path)
    }

    /// Parse module bytes with this runtime's engine
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<CompiledModule, WasmError> {
        CompiledModule::from_bytes(&self.engine, bytes)
    }

    /// Instantiate `module` against a fresh host ABI and run it to completion
    pub fn run(&self, module: &CompiledModule) -> Result<HostRecord, RunFailure> {
        self.instantiate(module)?.execute()
    }

    /// Bind a fresh host ABI and instantiate `module`, running its start
    /// function.
    ///
    /// Each call gets its own store, and with it its own linear memory.
    pub fn instantiate(&self, module: &CompiledModule) -> Result<Instantiated, RunFailure> {
        let mut store = Store::new(&self.engine, HostRecord::default());

        let linked = HostAbi::new(
            &self.engine,
            &mut store,
            &self.config.namespace,
            self.config.memory_type(),
        )
        .and_then(|abi| abi.linker().instantiate(&mut store, module.module()));

        match linked {
            Ok(instance) => {
                debug!("Module instantiated");
                Ok(Instantiated {
                    store,
                    instance: Some(instance),
                    entry_point: self.config.entry_point.clone(),
                })
            }
            Err(err) => {
                let record = classify_failure(err, store.into_data())?;
                Ok(Instantiated {
                    store: Store::new(&self.engine, record),
                    instance: None,
                    entry_point: None,
                })
            }
        }
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &WasmConfig {
        &self.config
    }
}

/// An instantiated module waiting to run its entry point
pub struct Instantiated {
    store: Store<HostRecord>,
    /// `None` when the start function already halted the guest
    instance: Option<Instance>,
    entry_point: Option<String>,
}

impl Instantiated {
    /// What the guest has reported so far
    pub fn record(&self) -> &HostRecord {
        self.store.data()
    }

    /// Call the configured entry point, if any, and hand back the record
    pub fn execute(mut self) -> Result<HostRecord, RunFailure> {
        let called = match (self.instance, &self.entry_point) {
            (Some(instance), Some(entry)) => {
                debug!(entry = %entry, "Calling entry point");
                instance
                    .get_typed_func::<(), ()>(&mut self.store, entry)
                    .and_then(|func| func.call(&mut self.store, ()))
            }
            _ => Ok(()),
        };

        let record = self.store.into_data();
        match called {
            Ok(()) => Ok(record),
            Err(err) => classify_failure(err, record),
        }
    }
}

/// Decide whether a failed run is the guest's own halt or a real failure
fn classify_failure(err: wasmtime::Error, record: HostRecord) -> Result<HostRecord, RunFailure> {
    if let Some(violation) = err.downcast_ref::<AbiViolation>() {
        warn!("{}", violation);
        return Err(RunFailure::new(
            WasmError::Instantiation(violation.to_string()),
            record,
        ));
    }

    // Guests halt after `abort`, usually with `unreachable`
    if let Some(signal) = record.abort {
        debug!(signal, "Trap after abort: {:#}", err);
        return Ok(record);
    }

    Err(RunFailure::new(WasmError::Instantiation(format!("{err:#}")), record))
}
