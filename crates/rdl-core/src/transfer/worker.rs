//! One background worker thread per running transfer.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

use crate::control::{PathBusy, TransferControl};

use super::controller::TransferController;
use super::events::{self, EventReceiver};
use super::{Transfer, TransferStatus};

/// Why a worker could not be started.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Busy(#[from] PathBusy),
    #[error("cannot start a transfer in state {0:?}")]
    InvalidState(TransferStatus),
    #[error("failed to spawn transfer worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Caller-side handle of a running worker.
///
/// Requests made through `control` only set flags; the worker acts on them at
/// the next chunk boundary and then reports the terminal event.
#[derive(Debug)]
pub struct TransferHandle {
    control: Arc<TransferControl>,
    worker: JoinHandle<Transfer>,
    target: PathBuf,
}

impl TransferHandle {
    /// Shared pause/cancel flags, for signal handlers and other threads.
    pub fn control(&self) -> Arc<TransferControl> {
        Arc::clone(&self.control)
    }

    /// Waits for the worker and returns the transfer in its final state. A
    /// `Paused` transfer can be passed to `TransferController::resume`.
    pub fn join(self) -> Result<Transfer> {
        self.worker
            .join()
            .map_err(|_| anyhow::anyhow!("transfer worker for {} panicked", self.target.display()))
    }
}

impl TransferController {
    /// Starts an `Idle` transfer on a dedicated worker thread.
    pub fn start(
        self: &Arc<Self>,
        transfer: Transfer,
    ) -> Result<(TransferHandle, EventReceiver), StartError> {
        if transfer.status != TransferStatus::Idle {
            return Err(StartError::InvalidState(transfer.status));
        }
        self.spawn(transfer)
    }

    /// Resumes a `Paused` transfer from its on-disk length. The size recorded
    /// by the first probe is checked against a fresh probe.
    pub fn resume(
        self: &Arc<Self>,
        transfer: Transfer,
    ) -> Result<(TransferHandle, EventReceiver), StartError> {
        if transfer.status != TransferStatus::Paused {
            return Err(StartError::InvalidState(transfer.status));
        }
        self.spawn(transfer)
    }

    fn spawn(
        self: &Arc<Self>,
        mut transfer: Transfer,
    ) -> Result<(TransferHandle, EventReceiver), StartError> {
        let control = Arc::new(TransferControl::new());
        let target = transfer.target_path.clone();
        let claim = self.registry.claim(&target)?;
        let (tx, rx) = events::channel();
        let controller = Arc::clone(self);
        let worker_control = Arc::clone(&control);

        let worker = std::thread::Builder::new()
            .name("rdl-transfer".to_string())
            .spawn(move || {
                let outcome = controller.execute(&mut transfer, &worker_control, &tx);
                // Release the path before the caller can observe the outcome.
                drop(claim);
                tx.finish(outcome);
                transfer
            })?;

        Ok((
            TransferHandle {
                control,
                worker,
                target,
            },
            rx,
        ))
    }
}
