//! Compiled artifact loading and validation

use crate::error::WasmError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use wasmtime::{Engine, Module};

/// Largest artifact the loader will hand to wasmtime (64MB)
const MAX_MODULE_SIZE: usize = 64 * 1024 * 1024;

/// Metadata extracted from a compiled artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// SHA256 hash of the module bytes
    pub hash: String,
    /// Size of the module in bytes
    pub size: usize,
    /// Exported items
    pub exports: Vec<String>,
    /// Imports the host has to satisfy
    pub imports: Vec<WasmImport>,
}

/// Information about a WASM import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasmImport {
    /// Namespace (e.g., "c0deine")
    pub module: String,
    /// Item name
    pub name: String,
}

/// A parsed module ready for instantiation
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Where the artifact was read from, if it came from disk
    pub path: Option<PathBuf>,
    /// Module metadata
    pub metadata: ModuleMetadata,
    module: Module,
}

impl CompiledModule {
    /// Artifact path for a source file: `<source>.wasm`
    pub fn artifact_path<P: AsRef<Path>>(source: P) -> PathBuf {
        let mut path = source.as_ref().as_os_str().to_owned();
        path.push(".wasm");
        PathBuf::from(path)
    }

    /// Read and parse the artifact at `path`
    pub fn load<P: AsRef<Path>>(engine: &Engine, path: P) -> Result<Self, WasmError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => WasmError::ArtifactMissing(path.to_path_buf()),
            _ => WasmError::Io(e),
        })?;

        let mut module = Self::from_bytes(engine, &bytes)?;
        module.path = Some(path.to_path_buf());
        Ok(module)
    }

    /// Parse a module from raw bytes
    pub fn from_bytes(engine: &Engine, bytes: &[u8]) -> Result<Self, WasmError> {
        Self::validate_basic_format(bytes)?;

        let module = Module::from_binary(engine, bytes)
            .map_err(|e| WasmError::MalformedBinary(format!("{e:#}")))?;
        let metadata = Self::extract_metadata(bytes, &module);

        debug!(
            hash = %metadata.hash,
            size = metadata.size,
            imports = metadata.imports.len(),
            "Parsed module"
        );

        Ok(CompiledModule {
            path: None,
            metadata,
            module,
        })
    }

    /// The wasmtime module
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Get the module hash
    pub fn hash(&self) -> &str {
        &self.metadata.hash
    }

    /// Check whether the module imports `name` from `namespace`
    pub fn imports(&self, namespace: &str, name: &str) -> bool {
        self.metadata
            .imports
            .iter()
            .any(|imp| imp.module == namespace && imp.name == name)
    }

    /// Check whether the module exports `name`
    pub fn exports(&self, name: &str) -> bool {
        self.metadata.exports.iter().any(|export| export == name)
    }

    fn extract_metadata(bytes: &[u8], module: &Module) -> ModuleMetadata {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("{:x}", hasher.finalize());

        let exports = module
            .exports()
            .map(|export| export.name().to_string())
            .collect();
        let imports = module
            .imports()
            .map(|import| WasmImport {
                module: import.module().to_string(),
                name: import.name().to_string(),
            })
            .collect();

        ModuleMetadata {
            hash,
            size: bytes.len(),
            exports,
            imports,
        }
    }

    /// Reject obviously broken artifacts before wasmtime sees them
    fn validate_basic_format(bytes: &[u8]) -> Result<(), WasmError> {
        if bytes.len() < 8 {
            return Err(WasmError::MalformedBinary(
                "module too small (minimum 8 bytes)".to_string()
            ));
        }

        if &bytes[0..4] != b"\0asm" {
            return Err(WasmError::MalformedBinary(
                "invalid WASM magic number".to_string()
            ));
        }

        if bytes.len() > MAX_MODULE_SIZE {
            return Err(WasmError::MalformedBinary(format!(
                "module too large: {} bytes (max: {} bytes)",
                bytes.len(), MAX_MODULE_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_modules::{
        empty_module_wasm, result_wasm, INVALID_MAGIC_WASM, TRUNCATED_WASM,
    };
    use std::io::Write;

    #[test]
    fn test_empty_module() {
        let engine = Engine::default();
        let module = CompiledModule::from_bytes(&engine, empty_module_wasm()).unwrap();
        assert_eq!(module.metadata.size, empty_module_wasm().len());
        assert!(module.metadata.exports.is_empty());
        assert!(module.metadata.imports.is_empty());
        assert!(module.path.is_none());
    }

    #[test]
    fn test_abi_imports_detected() {
        let engine = Engine::default();
        let module = CompiledModule::from_bytes(&engine, &result_wasm(42)).unwrap();
        assert!(module.imports("c0deine", "memory"));
        assert!(module.imports("c0deine", "result"));
        assert!(module.imports("c0deine", "abort"));
        assert!(module.imports("c0deine", "error"));
        assert!(!module.imports("env", "result"));
    }

    #[test]
    fn test_invalid_magic() {
        let engine = Engine::default();
        let result = CompiledModule::from_bytes(&engine, INVALID_MAGIC_WASM);
        assert!(matches!(result.unwrap_err(), WasmError::MalformedBinary(_)));
    }

    #[test]
    fn test_empty_bytes() {
        let engine = Engine::default();
        let result = CompiledModule::from_bytes(&engine, &[]);
        assert!(matches!(result.unwrap_err(), WasmError::MalformedBinary(_)));
    }

    #[test]
    fn test_truncated_body_is_malformed() {
        let engine = Engine::default();
        let result = CompiledModule::from_bytes(&engine, TRUNCATED_WASM);
        assert!(matches!(result.unwrap_err(), WasmError::MalformedBinary(_)));
    }

    #[test]
    fn test_module_too_large() {
        let mut large_bytes = vec![0x00, 0x61, 0x73, 0x6d];
        large_bytes.extend(vec![0x01, 0x00, 0x00, 0x00]);
        large_bytes.extend(vec![0x00; 65 * 1024 * 1024]);

        let engine = Engine::default();
        let result = CompiledModule::from_bytes(&engine, &large_bytes);
        assert!(matches!(result.unwrap_err(), WasmError::MalformedBinary(_)));
    }

    #[test]
    fn test_hash_calculation() {
        let engine = Engine::default();
        let module1 = CompiledModule::from_bytes(&engine, empty_module_wasm()).unwrap();
        let module2 = CompiledModule::from_bytes(&engine, &result_wasm(1)).unwrap();
        assert_ne!(module1.hash(), module2.hash());

        let module1_copy = CompiledModule::from_bytes(&engine, empty_module_wasm()).unwrap();
        assert_eq!(module1.hash(), module1_copy.hash());
    }

    #[test]
    fn test_artifact_path_appends_extension() {
        assert_eq!(
            CompiledModule::artifact_path("tests/fact.c0"),
            PathBuf::from("tests/fact.c0.wasm")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.c0.wasm");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&result_wasm(3))
            .unwrap();

        let engine = Engine::default();
        let module = CompiledModule::load(&engine, &path).unwrap();
        assert_eq!(module.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_artifact() {
        let engine = Engine::default();
        let result = CompiledModule::load(&engine, "/nonexistent/path/prog.c0.wasm");
        assert!(matches!(result.unwrap_err(), WasmError::ArtifactMissing(_)));
    }
}
