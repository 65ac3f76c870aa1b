//! c0harness binary
//!
//! Compiles a source file, runs the resulting module and prints the outcome.

use anyhow::{Context, Result};
use c0harness::{Harness, HarnessConfig};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

/// Compile a source file to WebAssembly, run it and report the outcome
#[derive(Debug, Parser)]
#[command(name = "c0harness", version, about)]
struct Cli {
    /// Source file to compile and run
    source: PathBuf,

    /// Compiler command, space separated; the source path is appended
    #[arg(long, env = "C0HARNESS_COMPILER", value_delimiter = ' ')]
    compiler: Vec<String>,

    /// Import namespace the module's ABI lives under
    #[arg(long)]
    namespace: Option<String>,

    /// Export to call after instantiation
    #[arg(long)]
    entry: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// File configuration with command line overrides applied
    fn harness_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => HarnessConfig::default(),
        };

        let compiler: Vec<String> = self
            .compiler
            .iter()
            .filter(|arg| !arg.is_empty())
            .cloned()
            .collect();
        if !compiler.is_empty() {
            config = config.with_compiler(compiler);
        }
        if let Some(namespace) = &self.namespace {
            config.wasm.namespace = namespace.clone();
        }
        if let Some(entry) = &self.entry {
            config.wasm.entry_point = Some(entry.clone());
        }

        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.harness_config()?;
    let harness = Harness::from_config(&config).context("Failed to set up harness")?;

    info!("Running {}", cli.source.display());
    let report = harness.run(&cli.source).await;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        report.write_json(&mut out)?;
    } else {
        report.write_report(&mut out)?;
    }
    out.flush()?;

    Ok(())
}
