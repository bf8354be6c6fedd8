//! The job source: enumerate the input directory into an ordered job list.

use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::scheduler::JobList;

/// Hidden entries (`.DS_Store` and friends) must never become jobs.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Enumerate `dir` into a stable, sorted job list.
///
/// Hidden entries and subdirectories (notably the `dist` output directory,
/// which lives inside the input directory) are excluded. A missing or
/// unreadable directory is fatal: the run must not begin.
pub fn scan_input_dir(dir: &Path) -> Result<JobList> {
    if !dir.exists() {
        return Err(PipelineError::InputDirNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory(dir.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            tracing::debug!(name = %name, "Skipping hidden entry");
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }
        names.push(name);
    }

    // read_dir order is platform-dependent; sort for a stable enumeration.
    names.sort();
    Ok(JobList::new(names))
}

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}
