//! Run every `.msx` script under a directory once.

use crate::error::RunError;
use crate::interpreter::Interpreter;
use anyhow::{Result, bail};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Extension of runnable scripts.
pub const SCRIPT_EXTENSION: &str = "msx";

/// Result of one batch pass.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub passed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

/// Every `.msx` file under `dir`, sorted by path.
pub fn discover_scripts(dir: &Path) -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|x| x == SCRIPT_EXTENSION)
                    .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    scripts.sort();
    scripts
}

/// Run each script in `dir` once. A failing script is reported and the
/// batch moves on to the next one.
pub fn run_dir(msx: &mut Interpreter, dir: &Path, out: &mut dyn Write) -> Result<BatchReport> {
    if !dir.is_dir() {
        bail!("Extension folder '{}' does not exist.", dir.display());
    }

    writeln!(out, "Testing extension: {}", dir.display())?;
    let mut report = BatchReport::default();

    for script in discover_scripts(dir) {
        writeln!(out, "\nRunning: {}", script.display())?;
        match msx.run_file(&script, out) {
            Ok(()) => report.passed.push(script),
            Err(RunError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!(script = %script.display(), error = %e, "script failed");
                writeln!(out, "Error in {}: {}", script.display(), e)?;
                report.failed.push((script, e.to_string()));
            }
        }
    }

    info!(
        passed = report.passed.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    if report.is_success() {
        writeln!(out, "\nAll {} scripts completed successfully.", report.total())?;
    } else {
        writeln!(
            out,
            "\n{} of {} scripts failed.",
            report.failed.len(),
            report.total()
        )?;
    }
    Ok(report)
}
