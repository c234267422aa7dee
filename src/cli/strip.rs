use std::io::Write;

use anyhow::Result;
use docsift_core::strip_markers;

pub fn run(file: &str) -> Result<()> {
    let annotated = super::read_input(file)?;
    let mut out = std::io::stdout().lock();
    out.write_all(strip_markers(&annotated).as_bytes())?;
    out.flush()?;
    Ok(())
}
