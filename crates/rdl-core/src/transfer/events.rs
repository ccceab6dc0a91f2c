//! Worker -> notification context boundary.
//!
//! The worker publishes `TransferEvent`s on a single-consumer channel; whoever
//! holds the `EventReceiver` drains them in production order and hands them to
//! a `TransferListener`. `EventSender::finish` consumes the sender, so nothing
//! can follow the terminal event.

use std::sync::mpsc::{self, Receiver, Sender};

use super::TransferStatus;
use crate::error::TransferError;

/// Payload of a progress notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// 0..=100, strictly increasing within a run.
    pub percent: u8,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

/// How a run ended. Exactly one is reported per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Succeeded,
    Failed(TransferError),
    Paused,
    Canceled,
}

impl TransferOutcome {
    pub fn status(&self) -> TransferStatus {
        match self {
            TransferOutcome::Succeeded => TransferStatus::Succeeded,
            TransferOutcome::Failed(_) => TransferStatus::Failed,
            TransferOutcome::Paused => TransferStatus::Paused,
            TransferOutcome::Canceled => TransferStatus::Canceled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Progress(ProgressUpdate),
    Finished(TransferOutcome),
}

/// Presentation-layer callbacks. Every method defaults to a no-op so a
/// listener only implements what it renders.
pub trait TransferListener {
    fn on_progress(&mut self, _update: &ProgressUpdate) {}
    /// The file at the target path is complete.
    fn on_success(&mut self) {}
    fn on_failed(&mut self, _error: &TransferError) {}
    /// The partial file is kept; the transfer can be resumed.
    fn on_paused(&mut self) {}
    /// The partial file has been removed.
    fn on_canceled(&mut self) {}
}

/// Creates the channel between one worker and its notification context.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (
        EventSender { tx },
        EventReceiver {
            rx,
            finished: false,
        },
    )
}

/// Worker side. Send failures are ignored: a caller that dropped its receiver
/// has stopped listening, which must not affect the transfer.
#[derive(Debug)]
pub struct EventSender {
    tx: Sender<TransferEvent>,
}

impl EventSender {
    pub fn progress(&self, update: ProgressUpdate) {
        let _ = self.tx.send(TransferEvent::Progress(update));
    }

    pub fn finish(self, outcome: TransferOutcome) {
        let _ = self.tx.send(TransferEvent::Finished(outcome));
    }
}

/// Notification-context side.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<TransferEvent>,
    finished: bool,
}

impl EventReceiver {
    /// Blocks for the next event. `None` after the terminal event, or if the
    /// worker went away without sending one.
    pub fn recv(&mut self) -> Option<TransferEvent> {
        if self.finished {
            return None;
        }
        let event = self.rx.recv().ok()?;
        self.note(&event);
        Some(event)
    }

    /// Delivers events to `listener` until the run ends. Returns the outcome,
    /// or `None` if the worker died before reporting one.
    pub fn dispatch(&mut self, listener: &mut dyn TransferListener) -> Option<TransferOutcome> {
        while let Some(event) = self.recv() {
            if let Some(outcome) = deliver(event, listener) {
                return Some(outcome);
            }
        }
        None
    }

    fn note(&mut self, event: &TransferEvent) {
        if matches!(event, TransferEvent::Finished(_)) {
            self.finished = true;
        }
    }
}

fn deliver(event: TransferEvent, listener: &mut dyn TransferListener) -> Option<TransferOutcome> {
    match event {
        TransferEvent::Progress(update) => {
            listener.on_progress(&update);
            None
        }
        TransferEvent::Finished(outcome) => {
            match &outcome {
                TransferOutcome::Succeeded => listener.on_success(),
                TransferOutcome::Failed(e) => listener.on_failed(e),
                TransferOutcome::Paused => listener.on_paused(),
                TransferOutcome::Canceled => listener.on_canceled(),
            }
            Some(outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl TransferListener for Log {
        fn on_progress(&mut self, update: &ProgressUpdate) {
            self.0.push(format!("progress {}", update.percent));
        }
        fn on_success(&mut self) {
            self.0.push("success".into());
        }
        fn on_failed(&mut self, error: &TransferError) {
            self.0.push(format!("failed {:?}", error.kind));
        }
    }

    fn update(percent: u8) -> ProgressUpdate {
        ProgressUpdate {
            percent,
            downloaded_bytes: u64::from(percent) * 10,
            total_bytes: 1000,
        }
    }

    #[test]
    fn dispatch_delivers_in_order_and_stops_at_terminal() {
        let (tx, mut rx) = channel();
        tx.progress(update(10));
        tx.progress(update(55));
        tx.finish(TransferOutcome::Succeeded);
        let mut log = Log::default();
        assert_eq!(rx.dispatch(&mut log), Some(TransferOutcome::Succeeded));
        assert_eq!(log.0, vec!["progress 10", "progress 55", "success"]);
        assert_eq!(rx.recv(), None);
    }

    #[test]
    fn failure_is_delivered_to_listener() {
        let (tx, mut rx) = channel();
        tx.progress(update(3));
        tx.finish(TransferOutcome::Failed(TransferError::new(
            ErrorKind::TransferIO,
            "disk full",
        )));
        let mut log = Log::default();
        assert!(matches!(
            rx.dispatch(&mut log),
            Some(TransferOutcome::Failed(_))
        ));
        assert_eq!(log.0, vec!["progress 3", "failed TransferIO"]);
    }

    #[test]
    fn dropped_worker_yields_no_outcome() {
        let (tx, mut rx) = channel();
        tx.progress(update(1));
        drop(tx);
        let mut log = Log::default();
        assert_eq!(rx.dispatch(&mut log), None);
        assert_eq!(log.0, vec!["progress 1"]);
    }

    #[test]
    fn outcome_maps_to_status() {
        assert_eq!(TransferOutcome::Paused.status(), TransferStatus::Paused);
        assert_eq!(TransferOutcome::Canceled.status(), TransferStatus::Canceled);
    }
}
