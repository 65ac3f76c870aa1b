//! Host ABI: one namespace exposing linear memory plus the `result`,
//! `abort` and `error` bindings.

use crate::decode::decode_c0_string;
use crate::error::AbiViolation;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wasmtime::{Caller, Engine, Linker, Memory, MemoryType, Store};

/// What the guest reported through the host ABI during one run.
///
/// At most one of `result` and `abort` is ever set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Code passed to `result`
    pub result: Option<i32>,
    /// Signal passed to `abort`
    pub abort: Option<i32>,
    /// Strings passed to `error`, in call order
    pub diagnostics: Vec<String>,
}

impl HostRecord {
    /// Record normal completion
    pub fn record_result(&mut self, code: i32) -> Result<(), AbiViolation> {
        self.check_unset("result")?;
        self.result = Some(code);
        Ok(())
    }

    /// Record abnormal termination
    pub fn record_abort(&mut self, signal: i32) -> Result<(), AbiViolation> {
        self.check_unset("abort")?;
        self.abort = Some(signal);
        Ok(())
    }

    /// Append one diagnostic line
    pub fn push_diagnostic(&mut self, message: String) {
        self.diagnostics.push(message);
    }

    fn check_unset(&self, call: &'static str) -> Result<(), AbiViolation> {
        let previous = match (self.result, self.abort) {
            (Some(_), _) => "result",
            (_, Some(_)) => "abort",
            (None, None) => return Ok(()),
        };
        Err(AbiViolation { call, previous })
    }
}

/// Host import table for a single run.
///
/// Owns the run's linear memory handle and a linker with the four fixed
/// names bound under `namespace`. Built fresh for every store.
pub struct HostAbi {
    memory: Memory,
    linker: Linker<HostRecord>,
}

impl HostAbi {
    /// Create the run's memory inside `store` and bind the ABI
    pub fn new(
        engine: &Engine,
        store: &mut Store<HostRecord>,
        namespace: &str,
        memory_type: MemoryType,
    ) -> wasmtime::Result<Self> {
        let memory = Memory::new(&mut *store, memory_type)?;
        let mut linker = Linker::new(engine);

        linker.define(&*store, namespace, "memory", memory)?;

        linker.func_wrap(
            namespace,
            "result",
            |mut caller: Caller<'_, HostRecord>, code: i32| -> wasmtime::Result<()> {
                debug!(code, "guest called result");
                caller.data_mut().record_result(code)?;
                Ok(())
            },
        )?;

        linker.func_wrap(
            namespace,
            "abort",
            |mut caller: Caller<'_, HostRecord>, signal: i32| -> wasmtime::Result<()> {
                debug!(signal, "guest called abort");
                caller.data_mut().record_abort(signal)?;
                Ok(())
            },
        )?;

        linker.func_wrap(
            namespace,
            "error",
            move |mut caller: Caller<'_, HostRecord>, ptr: i32| {
                let message = decode_c0_string(memory.data(&caller), ptr);
                debug!(ptr, "guest called error: {}", message);
                caller.data_mut().push_diagnostic(message);
            },
        )?;

        Ok(HostAbi { memory, linker })
    }

    /// The run's linear memory
    pub fn memory(&self) -> Memory {
        self.memory
    }

    /// Linker holding the bound imports
    pub fn linker(&self) -> &Linker<HostRecord> {
        &self.linker
    }
}
