use anyhow::Result;
use clap::Parser;

use docsift::cli::process::ProcessArgs;
use docsift::cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command)
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Process {
            dicts,
            config,
            jobs,
            out_dir,
            pretty,
            files,
        } => docsift::cli::process::run(&ProcessArgs {
            dicts: &dicts,
            config: config.as_deref(),
            jobs,
            out_dir: out_dir.as_deref(),
            pretty,
            files: &files,
        }),
        Commands::Check { dicts, config } => docsift::cli::check::run(&dicts, config.as_deref()),
        Commands::Strip { file } => docsift::cli::strip::run(&file),
    }
}
