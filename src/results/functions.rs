//! The impls and functions
//!
use std::{fs, io::Write, path::Path};
use log::*;
use anyhow::{Context, Result};

/// The line that marks a failed run in the results file.
pub const FAILURE_MARKER: &str = "App pool reset FAILED";

/// Write the result lines to the results file.
/// The file is created if it doesn't exist, and the lines of a previous run are overwritten.
pub fn write_results(
    results_file: &Path,
    lines: &[String],
) -> Result<()>
{
    info!("write {} result lines to {}", lines.len(), results_file.display());
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(results_file)
        .with_context(|| format!("Cannot create file: {}", results_file.display()))?;

    for line in lines {
        writeln!(file, "{}", line)
            .with_context(|| format!("Error writing file: {}", results_file.display()))?;
    }
    Ok(())
}

/// Append the error, with all of its context, and the failure line to the results file.
pub fn write_failure(
    results_file: &Path,
    error: &anyhow::Error,
) -> Result<()>
{
    info!("write failure to {}", results_file.display());
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(results_file)
        .with_context(|| format!("Cannot open file: {}", results_file.display()))?;

    writeln!(file, "{:?}", error)
        .and_then(|_| writeln!(file, "{}", FAILURE_MARKER))
        .with_context(|| format!("Error writing file: {}", results_file.display()))?;
    Ok(())
}
