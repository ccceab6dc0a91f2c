//! TransferController: the probe -> fetch -> write state machine.
//!
//! ```text
//! Idle -> Running -> { Paused, Canceled, Succeeded, Failed }
//! Paused -> Running   (resume: fresh probe and fetch from the on-disk length)
//! ```
//!
//! A run probes the total size once, opens the partial file, and streams the
//! remainder with an open-ended range request. Pause/cancel are polled at
//! every chunk boundary. Progress and the single terminal event go out on the
//! transfer's event channel.

mod controller;
mod events;
mod progress;
mod worker;


pub use controller::{ResumePolicy, TransferController};
pub use events::{
    channel, EventReceiver, EventSender, ProgressUpdate, TransferEvent, TransferListener,
    TransferOutcome,
};
pub use progress::{percent, ProgressTracker};
pub use worker::{StartError, TransferHandle};

use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Idle,
    Running,
    Paused,
    Canceled,
    Succeeded,
    Failed,
}

/// One download attempt. URL and target path are fixed for its lifetime;
/// the counters reflect the last run.
#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    source_url: String,
    target_path: PathBuf,
    /// Size from the first successful probe; 0 until then.
    total_bytes: u64,
    downloaded_bytes: u64,
    status: TransferStatus,
    last_reported_progress: u8,
}

impl Transfer {
    pub fn new(source_url: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            target_path: target_path.into(),
            total_bytes: 0,
            downloaded_bytes: 0,
            status: TransferStatus::Idle,
            last_reported_progress: 0,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn last_reported_progress(&self) -> u8 {
        self.last_reported_progress
    }

    /// Current completion percentage.
    pub fn percent(&self) -> u8 {
        percent(self.downloaded_bytes, self.total_bytes)
    }

    /// Forget counters tied to the bytes on disk (after a discard or truncate).
    fn reset_progress(&mut self) {
        self.downloaded_bytes = 0;
        self.last_reported_progress = 0;
    }
}
