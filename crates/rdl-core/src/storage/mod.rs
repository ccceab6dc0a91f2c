//! Disk side of a transfer: the partial file at the target path.
//!
//! The file's length on disk is the resume checkpoint; there is no separate
//! journal. Writes land directly in the target file and are strictly
//! contiguous, so a file is never left with a hole or a torn chunk.

mod writer;

pub use writer::ResumableWriter;

use anyhow::{Context, Result};
use std::io;
use std::path::Path;

/// Current length of the partial file, 0 if it does not exist.
pub fn existing_len(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e).with_context(|| format!("failed to stat {}", path.display())),
    }
}

/// Deletes the partial file. A file that is already gone is not an error.
pub fn discard(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "discarded partial file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_len_of_missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(existing_len(&dir.path().join("nope.bin")).unwrap(), 0);
    }

    #[test]
    fn existing_len_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("part.bin");
        std::fs::write(&p, vec![7u8; 400]).unwrap();
        assert_eq!(existing_len(&p).unwrap(), 400);
    }

    #[test]
    fn discard_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("part.bin");
        std::fs::write(&p, b"abc").unwrap();
        discard(&p).unwrap();
        assert!(!p.exists());
        discard(&p).unwrap();
    }
}
