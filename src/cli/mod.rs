pub mod check;
pub mod process;
pub mod strip;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsift_core::{DictionarySource, Engine};

#[derive(Parser)]
#[command(
    name = "docsift",
    about = "Dictionary-driven document classification and entity extraction",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify documents and extract entities and measurements
    Process {
        /// Dictionary file or directory of *.json dictionaries (repeatable)
        #[arg(short = 'd', long = "dict", required = true)]
        dicts: Vec<PathBuf>,
        /// JSON engine configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
        /// Worker threads (defaults to one per core)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
        /// Write one <stem>.json per input here instead of JSON lines to stdout
        #[arg(short = 'o', long = "out-dir")]
        out_dir: Option<PathBuf>,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
        /// Input text files; "-" reads stdin
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Load and compile dictionaries, then print statistics
    Check {
        /// Dictionary file or directory of *.json dictionaries (repeatable)
        #[arg(short = 'd', long = "dict", required = true)]
        dicts: Vec<PathBuf>,
        /// JSON engine configuration file
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,
    },
    /// Remove annotation markers from processed text
    Strip {
        /// Annotated text file; "-" reads stdin
        file: String,
    },
}

pub(crate) fn build_engine(dicts: &[PathBuf], config: Option<&Path>) -> Result<Engine> {
    let config = crate::config::load(config)?;
    let sources = dicts.iter().map(DictionarySource::path);
    Engine::from_sources(sources, config).context("Failed to build engine")
}

pub(crate) fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}
