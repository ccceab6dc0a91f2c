//! Pause/cancel flags and per-path exclusivity.
//!
//! Each running transfer owns a `TransferControl`. The worker polls it once per
//! chunk; callers set it from any thread. A `TransferRegistry` records the
//! target paths that have a running transfer, so a second transfer on the same
//! file is rejected instead of interleaving writes.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// A pending stop request, as seen by the worker at a chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    Pause,
    Cancel,
}

/// Level-triggered pause/cancel flags for one run.
#[derive(Debug, Default)]
pub struct TransferControl {
    pause: AtomicBool,
    cancel: AtomicBool,
}

impl TransferControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::Release);
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Cancel wins over pause when both are set.
    pub fn pending(&self) -> Option<StopRequest> {
        if self.cancel.load(Ordering::Acquire) {
            Some(StopRequest::Cancel)
        } else if self.pause.load(Ordering::Acquire) {
            Some(StopRequest::Pause)
        } else {
            None
        }
    }
}

/// Returned when a target path already has a running transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a transfer is already running for {}", .0.display())]
pub struct PathBusy(pub PathBuf);

/// Paths that currently have a running transfer.
///
/// Keys are normalized with `claim_key`, so `dir/out.bin` and
/// `dir/sub/../out.bin` contend for the same claim.
#[derive(Debug, Default)]
pub struct TransferRegistry {
    active: Mutex<HashSet<PathBuf>>,
}

impl TransferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as busy. The claim is released when the returned guard drops.
    pub fn claim(self: &Arc<Self>, path: &Path) -> Result<PathClaim, PathBusy> {
        let key = claim_key(path);
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(key.clone()) {
            return Err(PathBusy(path.to_path_buf()));
        }
        Ok(PathClaim {
            registry: Arc::clone(self),
            key,
        })
    }

    fn release(&self, key: &Path) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// Releases a path claim when dropped.
#[derive(Debug)]
pub struct PathClaim {
    registry: Arc<TransferRegistry>,
    key: PathBuf,
}

impl Drop for PathClaim {
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

/// Absolute form of `path` used as the registry key.
///
/// The parent is canonicalized when it exists, which also resolves symlinks.
/// Otherwise `.` and `..` are folded lexically; the worker has not created
/// the directory yet.
fn claim_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let lexical = fold_dots(&absolute);
    if let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) {
        if let Ok(parent) = std::fs::canonicalize(parent) {
            return parent.join(name);
        }
    }
    lexical
}

fn fold_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
