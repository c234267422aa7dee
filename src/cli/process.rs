use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use docsift_core::{BatchResult, DocumentResult, Engine};

pub struct ProcessArgs<'a> {
    pub dicts: &'a [PathBuf],
    pub config: Option<&'a Path>,
    pub jobs: Option<usize>,
    pub out_dir: Option<&'a Path>,
    pub pretty: bool,
    pub files: &'a [String],
}

pub fn run(args: &ProcessArgs<'_>) -> Result<()> {
    let engine = super::build_engine(args.dicts, args.config)?;

    let texts = args
        .files
        .iter()
        .map(|f| super::read_input(f))
        .collect::<Result<Vec<String>>>()?;

    let batch = match args.jobs {
        Some(jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Failed to start worker pool")?
            .install(|| engine.process_batch(&texts)),
        None => engine.process_batch(&texts),
    };

    match args.out_dir {
        Some(dir) => write_files(dir, args.files, &batch, args.pretty)?,
        None => write_lines(&batch, args.pretty)?,
    }

    report(&engine, &batch);
    Ok(())
}

fn render(document: &DocumentResult, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    json.context("Failed to serialize result")
}

fn write_lines(batch: &BatchResult, pretty: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for document in &batch.documents {
        writeln!(out, "{}", render(document, pretty)?)?;
    }
    out.flush()?;
    Ok(())
}

fn write_files(dir: &Path, inputs: &[String], batch: &BatchResult, pretty: bool) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let names = output_names(inputs);
    for ((input, name), document) in inputs.iter().zip(&names).zip(&batch.documents) {
        let target = dir.join(format!("{name}.json"));
        if target.exists() {
            tracing::warn!(path = %target.display(), "Overwriting existing output");
        }
        std::fs::write(&target, render(document, pretty)?)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        eprintln!(
            "{} {} -> {}",
            style("✓").green(),
            input,
            target.display()
        );
    }
    Ok(())
}

fn output_stem(input: &str) -> String {
    if input == "-" {
        return "stdin".to_string();
    }
    Path::new(input).file_stem().map_or_else(
        || "document".to_string(),
        |s| s.to_string_lossy().into_owned(),
    )
}

/// One distinct name per input. Repeated stems get `-2`, `-3`, ... in input
/// order, so `a/report.txt b/report.txt` writes `report.json` and
/// `report-2.json`.
fn output_names(inputs: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = output_stem(input);
            let mut name = stem.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}-{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn report(engine: &Engine, batch: &BatchResult) {
    let label = if batch.total() == 1 { "document" } else { "documents" };
    eprintln!(
        "{} Processed {} {label} ({} categories)",
        style("●").green(),
        batch.total(),
        engine.table().stats().categories
    );
    if batch.with_warnings > 0 {
        eprintln!(
            "  {} {} with warnings",
            style("!").yellow(),
            batch.with_warnings
        );
    }
}
