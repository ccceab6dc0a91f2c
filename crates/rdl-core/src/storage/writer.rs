//! Append-only writer over a resumable partial file.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Exclusive handle on the partial file of one running transfer.
///
/// The handle is released when the writer is dropped, so every exit path of
/// the controller closes the file. `close` additionally flushes to disk.
#[derive(Debug)]
pub struct ResumableWriter {
    file: File,
    path: PathBuf,
    /// Next write offset; equals the file length.
    len: u64,
}

impl ResumableWriter {
    /// Open (or create) the file without truncating it. The existing length is
    /// the resume offset; see `len`.
    pub fn open_for_resume(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to open partial file: {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len,
        })
    }

    /// Bytes currently persisted.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Write `data` at `offset`. Offsets must be contiguous: `offset == len()`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if offset != self.len {
            bail!(
                "non-contiguous write to {}: offset {} but file length is {}",
                self.path.display(),
                offset,
                self.len
            );
        }
        self.file
            .seek(SeekFrom::Start(offset))
            .context("storage seek failed")?;
        self.file
            .write_all(data)
            .with_context(|| format!("storage write failed at offset {}", offset))?;
        self.len += data.len() as u64;
        Ok(())
    }

    /// Drop all persisted bytes so the transfer restarts from offset 0.
    pub fn truncate(&mut self) -> Result<()> {
        self.file
            .set_len(0)
            .with_context(|| format!("failed to truncate {}", self.path.display()))?;
        self.len = 0;
        Ok(())
    }

    /// Sync file data to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("storage sync failed")?;
        Ok(())
    }

    /// Flush and release the handle.
    pub fn close(self) -> Result<()> {
        self.sync()
    }
}
