use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use docsift_core::dictionary::BUILTIN_PATTERN_VERSION;

pub fn run(dicts: &[PathBuf], config: Option<&Path>) -> Result<()> {
    let engine = super::build_engine(dicts, config)?;
    let stats = engine.table().stats();

    println!("categories: {}", stats.categories);
    println!("exact entries: {}", stats.exact_entries);
    println!("regex entries: {}", stats.regex_entries);
    if engine.config().builtin_patterns {
        println!("builtin patterns: v{BUILTIN_PATTERN_VERSION}");
    } else {
        println!("builtin patterns: disabled");
    }

    eprintln!("{} Dictionaries OK", style("✓").green());
    Ok(())
}
