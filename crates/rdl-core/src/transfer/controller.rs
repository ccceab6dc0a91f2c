use std::sync::Arc;

use crate::config::{CurlOptions, RdlConfig, SizeChangePolicy};
use crate::control::{StopRequest, TransferControl, TransferRegistry};
use crate::error::{ErrorKind, FetchError, TransferError};
use crate::fetch::{ByteStream, CurlFetcher, RangeFetcher};
use crate::fetch_head::{ContentProbe, CurlProbe};
use crate::storage::{self, ResumableWriter};

use super::events::{EventSender, ProgressUpdate, TransferOutcome};
use super::progress::ProgressTracker;
use super::{Transfer, TransferStatus};

/// Caller policy for situations where the partial file cannot be resumed as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumePolicy {
    pub on_size_change: SizeChangePolicy,
    /// Refetch from zero when a ranged GET comes back as a full `200`.
    pub restart_without_ranges: bool,
}

impl From<&RdlConfig> for ResumePolicy {
    fn from(cfg: &RdlConfig) -> Self {
        Self {
            on_size_change: cfg.on_size_change,
            restart_without_ranges: cfg.restart_without_ranges,
        }
    }
}

/// Drives transfers through probe, fetch and write.
pub struct TransferController {
    probe: Arc<dyn ContentProbe>,
    fetcher: Arc<dyn RangeFetcher>,
    policy: ResumePolicy,
    /// Paths with a running worker started by this controller.
    pub(super) registry: Arc<TransferRegistry>,
}

impl TransferController {
    pub fn new(probe: Arc<dyn ContentProbe>, fetcher: Arc<dyn RangeFetcher>) -> Self {
        Self {
            probe,
            fetcher,
            policy: ResumePolicy::default(),
            registry: Arc::new(TransferRegistry::new()),
        }
    }

    /// libcurl-backed controller configured from `cfg`.
    pub fn from_config(cfg: &RdlConfig) -> Self {
        let opts = CurlOptions::from(cfg);
        Self::new(
            Arc::new(CurlProbe::new(opts)),
            Arc::new(CurlFetcher::new(opts)),
        )
        .with_policy(ResumePolicy::from(cfg))
    }

    pub fn with_policy(mut self, policy: ResumePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs one attempt on the current thread and reports its outcome on `events`.
    pub fn run(
        &self,
        transfer: &mut Transfer,
        control: &TransferControl,
        events: EventSender,
    ) -> TransferOutcome {
        let outcome = self.execute(transfer, control, &events);
        events.finish(outcome.clone());
        outcome
    }

    /// The state machine without the terminal notification. All file and
    /// connection handles are released by the time this returns.
    pub(super) fn execute(
        &self,
        transfer: &mut Transfer,
        control: &TransferControl,
        events: &EventSender,
    ) -> TransferOutcome {
        transfer.status = TransferStatus::Running;
        tracing::info!(
            url = %transfer.source_url,
            path = %transfer.target_path.display(),
            "transfer running"
        );
        let outcome = match self.drive(transfer, control, events) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    url = %transfer.source_url,
                    downloaded = transfer.downloaded_bytes,
                    error = %err,
                    "transfer failed"
                );
                TransferOutcome::Failed(err)
            }
        };
        transfer.status = outcome.status();
        tracing::info!(
            status = ?transfer.status,
            downloaded = transfer.downloaded_bytes,
            total = transfer.total_bytes,
            "transfer finished"
        );
        outcome
    }

    fn drive(
        &self,
        transfer: &mut Transfer,
        control: &TransferControl,
        events: &EventSender,
    ) -> Result<TransferOutcome, TransferError> {
        let url = transfer.source_url.clone();
        if let Err(e) = url::Url::parse(&url) {
            return Err(TransferError::new(
                ErrorKind::InvalidResource,
                format!("invalid URL {}: {}", url, e),
            ));
        }

        let total = self.probe.probe(&url).map_err(TransferError::from_probe)?;
        if total == 0 {
            return Err(TransferError::new(
                ErrorKind::InvalidResource,
                "server reported a zero-length resource",
            ));
        }

        let mut writer = ResumableWriter::open_for_resume(&transfer.target_path)
            .map_err(|e| TransferError::io(&e))?;
        let known = transfer.total_bytes;
        if (known != 0 && known != total) || writer.len() > total {
            self.on_size_change(transfer, &mut writer, total)?;
        }
        transfer.total_bytes = total;
        transfer.downloaded_bytes = writer.len();
        tracing::debug!(url = %url, total, existing = writer.len(), "probed");

        if writer.len() == total {
            writer.close().map_err(|e| TransferError::io(&e))?;
            return Ok(TransferOutcome::Succeeded);
        }
        if let Some(stop) = control.pending() {
            return self.stop(transfer, writer, stop);
        }

        let mut stream = self.open_stream(&url, transfer, &mut writer)?;
        let mut tracker = ProgressTracker::new(total, transfer.last_reported_progress);
        while let Some(chunk) = stream.next_chunk().map_err(TransferError::from_fetch)? {
            if let Some(stop) = control.pending() {
                drop(stream);
                return self.stop(transfer, writer, stop);
            }
            let offset = writer.len();
            if offset + chunk.len() as u64 > total {
                return Err(TransferError::new(
                    ErrorKind::BadResponse,
                    format!(
                        "server sent more than the declared {} bytes (chunk of {} at offset {})",
                        total,
                        chunk.len(),
                        offset
                    ),
                ));
            }
            writer
                .write_at(offset, &chunk)
                .map_err(|e| TransferError::io(&e))?;
            transfer.downloaded_bytes = writer.len();
            if let Some(percent) = tracker.observe(transfer.downloaded_bytes) {
                transfer.last_reported_progress = percent;
                events.progress(ProgressUpdate {
                    percent,
                    downloaded_bytes: transfer.downloaded_bytes,
                    total_bytes: total,
                });
            }
        }
        drop(stream);

        if writer.len() < total {
            return Err(TransferError::new(
                ErrorKind::TransferIO,
                format!("partial transfer: received {} of {} bytes", writer.len(), total),
            ));
        }
        writer.close().map_err(|e| TransferError::io(&e))?;
        Ok(TransferOutcome::Succeeded)
    }

    /// Issues the ranged GET at the current file length, restarting from zero
    /// when the server ignores ranges and the policy allows it.
    fn open_stream(
        &self,
        url: &str,
        transfer: &mut Transfer,
        writer: &mut ResumableWriter,
    ) -> Result<Box<dyn ByteStream>, TransferError> {
        let start = writer.len();
        match self.fetcher.fetch(url, start) {
            Ok(stream) => Ok(stream),
            Err(FetchError::ServerError(200))
                if start > 0 && self.policy.restart_without_ranges =>
            {
                tracing::warn!(url, start, "server ignored range request, restarting from zero");
                writer.truncate().map_err(|e| TransferError::io(&e))?;
                transfer.reset_progress();
                self.fetcher
                    .fetch(url, 0)
                    .map_err(TransferError::from_fetch)
            }
            Err(e) => Err(TransferError::from_fetch(e)),
        }
    }

    fn on_size_change(
        &self,
        transfer: &mut Transfer,
        writer: &mut ResumableWriter,
        total: u64,
    ) -> Result<(), TransferError> {
        match self.policy.on_size_change {
            SizeChangePolicy::Fail => Err(TransferError::new(
                ErrorKind::ResourceChanged,
                format!(
                    "remote size is {} bytes; partial file has {} bytes (previous size {})",
                    total,
                    writer.len(),
                    transfer.total_bytes
                ),
            )),
            SizeChangePolicy::Restart => {
                tracing::warn!(
                    url = %transfer.source_url,
                    total,
                    previous = transfer.total_bytes,
                    existing = writer.len(),
                    "remote size changed, restarting from zero"
                );
                writer.truncate().map_err(|e| TransferError::io(&e))?;
                transfer.reset_progress();
                Ok(())
            }
        }
    }

    fn stop(
        &self,
        transfer: &mut Transfer,
        writer: ResumableWriter,
        stop: StopRequest,
    ) -> Result<TransferOutcome, TransferError> {
        match stop {
            StopRequest::Pause => {
                writer.close().map_err(|e| TransferError::io(&e))?;
                Ok(TransferOutcome::Paused)
            }
            StopRequest::Cancel => {
                drop(writer);
                storage::discard(&transfer.target_path).map_err(|e| TransferError::io(&e))?;
                transfer.reset_progress();
                Ok(TransferOutcome::Canceled)
            }
        }
    }
}
