//! `rdl get` – download one URL, resuming from the partial file at the target.
//!
//! The transfer runs on its own worker thread. Events are drained on a
//! blocking task so listener callbacks never run on the transfer thread.
//! The first Ctrl-C pauses (the partial file is kept), the second cancels.

use anyhow::{bail, Result};
use rdl_core::checksum;
use rdl_core::config::{RdlConfig, SizeChangePolicy};
use rdl_core::error::{ErrorKind, TransferError};
use rdl_core::storage;
use rdl_core::transfer::{
    ProgressUpdate, ResumePolicy, Transfer, TransferController, TransferListener,
    TransferOutcome,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Flags of `rdl get` that change controller policy or post-processing.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub force_restart: bool,
    pub restart_without_ranges: bool,
    pub sha256: Option<String>,
}

impl GetOptions {
    fn policy(&self, cfg: &RdlConfig) -> ResumePolicy {
        let mut policy = ResumePolicy::from(cfg);
        if self.force_restart {
            policy.on_size_change = SizeChangePolicy::Restart;
        }
        if self.restart_without_ranges {
            policy.restart_without_ranges = true;
        }
        policy
    }
}

/// Prints progress on stderr, overwriting one line.
#[derive(Default)]
struct ConsoleListener {
    printed: bool,
}

impl ConsoleListener {
    fn end_line(&mut self) {
        if self.printed {
            eprintln!();
            self.printed = false;
        }
    }
}

impl TransferListener for ConsoleListener {
    fn on_progress(&mut self, update: &ProgressUpdate) {
        let done_mib = update.downloaded_bytes as f64 / 1_048_576.0;
        let total_mib = update.total_bytes as f64 / 1_048_576.0;
        eprint!(
            "\r  {:.1} / {:.1} MiB ({}%)  ",
            done_mib, total_mib, update.percent
        );
        let _ = std::io::stderr().flush();
        self.printed = true;
    }

    fn on_success(&mut self) {
        self.end_line();
    }

    fn on_failed(&mut self, _error: &TransferError) {
        self.end_line();
    }

    fn on_paused(&mut self) {
        self.end_line();
    }

    fn on_canceled(&mut self) {
        self.end_line();
    }
}

/// Runs the transfer and returns the process exit code (1 when it failed).
pub async fn run_get(
    cfg: &RdlConfig,
    url: String,
    target: PathBuf,
    opts: GetOptions,
) -> Result<i32> {
    let controller = Arc::new(TransferController::from_config(cfg).with_policy(opts.policy(cfg)));
    let existing = storage::existing_len(&target)?;
    if existing > 0 {
        println!("Resuming {} from {} bytes", target.display(), existing);
    } else {
        println!("Downloading {} -> {}", url, target.display());
    }

    let (handle, mut events) = controller.start(Transfer::new(url, &target))?;
    let control = handle.control();
    let signals = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nPausing; press Ctrl-C again to cancel and delete the partial file.");
        control.request_pause();
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        control.request_cancel();
    });

    let outcome = tokio::task::spawn_blocking(move || {
        let mut console = ConsoleListener::default();
        events.dispatch(&mut console)
    })
    .await?;
    signals.abort();
    let transfer = tokio::task::spawn_blocking(move || handle.join()).await??;
    tracing::debug!(?transfer, "transfer joined");

    let Some(outcome) = outcome else {
        bail!("transfer worker exited without reporting an outcome");
    };
    match outcome {
        TransferOutcome::Succeeded => {
            if let Some(expected) = opts.sha256.as_deref() {
                checksum::verify_sha256(&target, expected)?;
                println!("SHA-256 verified.");
            }
            println!(
                "Saved {} ({} bytes).",
                target.display(),
                transfer.total_bytes()
            );
            Ok(0)
        }
        TransferOutcome::Paused => {
            println!(
                "Paused at {}% ({} of {} bytes). Run the same command to resume.",
                transfer.percent(),
                transfer.downloaded_bytes(),
                transfer.total_bytes()
            );
            Ok(0)
        }
        TransferOutcome::Canceled => {
            println!("Canceled; partial file removed.");
            Ok(0)
        }
        TransferOutcome::Failed(err) => {
            eprintln!("Download failed: {}", err);
            if let Some(hint) = hint_for(&err) {
                eprintln!("{}", hint);
            }
            Ok(1)
        }
    }
}

fn hint_for(err: &TransferError) -> Option<&'static str> {
    match err.kind {
        ErrorKind::ResourceChanged => {
            Some("The remote file changed; rerun with --force-restart to download it again.")
        }
        ErrorKind::ServerError if err.message.ends_with("HTTP 200") => {
            Some("The server ignored the range; rerun with --restart-without-ranges.")
        }
        _ => None,
    }
}
