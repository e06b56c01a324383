//! Whole-document I/O.
//!
//! The engine's only filesystem discipline: read the entire file, mutate in
//! memory, write the entire file. The new content is fully buffered before
//! any write syscall, and the write itself goes through a tempfile + fsync +
//! rename so a crash mid-write cannot leave a truncated target.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    /// Target path missing, unreadable, or not valid UTF-8. Fatal: the
    /// engine aborts before any mutation.
    #[error("cannot read document {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Write-back failed after the mutation was computed. The original file
    /// is unmodified because the replacement content never reached it.
    #[error("cannot write document {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read the full document as UTF-8 text.
pub fn load(path: &Path) -> Result<String, DocumentError> {
    fs::read_to_string(path).map_err(|source| DocumentError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the full document atomically: tempfile in the same directory,
/// fsync, rename over the target.
pub fn store(path: &Path, content: &str) -> Result<(), DocumentError> {
    let write_err = |source: std::io::Error| DocumentError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let parent = match parent {
        Some(p) => p,
        None => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
