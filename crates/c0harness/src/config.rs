//! Harness configuration

use crate::error::HarnessError;
use crate::Result;
use c0harness_wasm::WasmConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Compiler program followed by its leading arguments. The source path
    /// is appended as the final argument.
    pub compiler: Vec<String>,
    /// Module execution settings
    pub wasm: WasmConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: vec!["sh".to_string(), "compile.sh".to_string()],
            wasm: WasmConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the compiler command
    pub fn with_compiler<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiler = command.into_iter().map(Into::into).collect();
        self
    }

    /// Set the module execution settings
    pub fn with_wasm(mut self, wasm: WasmConfig) -> Self {
        self.wasm = wasm;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.compiler.is_empty() {
            return Err(HarnessError::Config("empty compiler command".to_string()));
        }
        if self.wasm.namespace.is_empty() {
            return Err(HarnessError::Config("empty import namespace".to_string()));
        }
        if let Some(max) = self.wasm.max_memory_pages {
            if max < self.wasm.initial_memory_pages {
                return Err(HarnessError::Config(format!(
                    "max_memory_pages ({}) below initial_memory_pages ({})",
                    max, self.wasm.initial_memory_pages
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.compiler, vec!["sh", "compile.sh"]);
        assert_eq!(config.wasm.namespace, "c0deine");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = HarnessConfig::default()
            .with_compiler(["c0c", "--wasm"])
            .with_wasm(WasmConfig::default().with_entry_point("main"));
        assert_eq!(config.compiler, vec!["c0c", "--wasm"]);
        assert_eq!(config.wasm.entry_point.as_deref(), Some("main"));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"wasm": {{"namespace": "c1"}}}}"#).unwrap();

        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.compiler, vec!["sh", "compile.sh"]);
        assert_eq!(config.wasm.namespace, "c1");
        assert_eq!(config.wasm.initial_memory_pages, 1);
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = HarnessConfig::from_file(file.path());
        assert!(matches!(result.unwrap_err(), HarnessError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_compiler() {
        let config = HarnessConfig::default().with_compiler(Vec::<String>::new());
        assert!(matches!(config.validate().unwrap_err(), HarnessError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_small_maximum() {
        let mut config = HarnessConfig::default();
        config.wasm.initial_memory_pages = 4;
        config.wasm.max_memory_pages = Some(2);
        assert!(config.validate().is_err());
    }
}
