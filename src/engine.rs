//! The patch engine: load, run, write back only on change.
//!
//! State machine per run: Loaded -> {Patched, Unchanged} -> {Written,
//! Skipped}, terminal in both branches. No retries, no partial commits.

use crate::document::{self, DocumentError};
use crate::patchset::{PatchSet, RunReport};
use std::fmt;
use std::path::{Path, PathBuf};

/// Terminal outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Outcome should be reported to the caller"]
pub enum Outcome {
    /// At least one transformation changed the document; the result was
    /// written back.
    Applied { path: PathBuf, report: RunReport },
    /// Nothing changed; the file on disk was not touched.
    NoOp { path: PathBuf, report: RunReport },
}

impl Outcome {
    pub fn report(&self) -> &RunReport {
        match self {
            Outcome::Applied { report, .. } | Outcome::NoOp { report, .. } => report,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied { path, report } => write!(
                f,
                "Applied {} transformation(s) to {}",
                report.applied.len(),
                path.display()
            ),
            Outcome::NoOp { path, .. } => {
                write!(f, "No changes to {} (already up to date)", path.display())
            }
        }
    }
}

/// Apply a patch set to the document at `path`.
///
/// Read failures abort before any mutation; write failures leave the
/// original file intact because the new content is fully buffered and then
/// written atomically.
pub fn execute(path: &Path, set: &PatchSet) -> Result<Outcome, DocumentError> {
    let original = document::load(path)?;
    let (patched, report) = set.run(&original);

    if report.changed {
        document::store(path, &patched)?;
        Ok(Outcome::Applied {
            path: path.to_path_buf(),
            report,
        })
    } else {
        Ok(Outcome::NoOp {
            path: path.to_path_buf(),
            report,
        })
    }
}

/// Evaluate a patch set against the document at `path` without writing.
///
/// Returns the would-be text and report; `Applied` semantics in the report
/// mean "would apply".
pub fn check(path: &Path, set: &PatchSet) -> Result<(String, RunReport), DocumentError> {
    let original = document::load(path)?;
    Ok(set.run(&original))
}
