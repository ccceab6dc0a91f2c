//! Companion thread that drives one libcurl transfer and feeds a bounded channel.

use crate::config::CurlOptions;
use crate::error::FetchError;
use std::cell::Cell;
use std::str;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::ByteStream;

/// Messages from the curl thread, in production order.
enum Frame {
    /// Status of the final response, sent before its first body chunk.
    Status(u32),
    Chunk(Vec<u8>),
    /// Transfer finished; carries the final response code or the curl error.
    Done(Result<u32, curl::Error>),
}

/// Pull side of a running curl transfer.
///
/// Dropping the stream closes the channel and raises `closed`; the curl thread
/// aborts at its next write or progress callback and is joined before `drop` returns.
pub struct CurlStream {
    rx: Option<Receiver<Frame>>,
    worker: Option<JoinHandle<()>>,
    closed: Arc<AtomicBool>,
    finished: bool,
}

impl CurlStream {
    pub(super) fn spawn(
        url: &str,
        start: u64,
        opts: CurlOptions,
        depth: usize,
    ) -> Result<Self, FetchError> {
        let (tx, rx) = mpsc::sync_channel(depth);
        let closed = Arc::new(AtomicBool::new(false));
        let closed_in_worker = Arc::clone(&closed);
        let url = url.to_string();
        let worker = std::thread::Builder::new()
            .name("rdl-fetch".to_string())
            .spawn(move || {
                let result = perform(&url, start, opts, &tx, &closed_in_worker);
                if let Err(e) = &result {
                    if !closed_in_worker.load(Ordering::Relaxed) {
                        tracing::debug!(url = %url, error = %e, "curl transfer ended with error");
                    }
                }
                let _ = tx.send(Frame::Done(result));
            })
            .map_err(|e| FetchError::Unreachable(format!("failed to spawn fetch thread: {}", e)))?;
        Ok(Self {
            rx: Some(rx),
            worker: Some(worker),
            closed,
            finished: false,
        })
    }

    /// Blocks until the response status is known.
    pub(super) fn await_status(&mut self) -> Result<u32, FetchError> {
        match self.recv() {
            Some(Frame::Status(code)) => Ok(code),
            Some(Frame::Done(Ok(code))) => {
                self.finished = true;
                Ok(code)
            }
            Some(Frame::Done(Err(e))) => {
                self.finished = true;
                Err(FetchError::Unreachable(e.to_string()))
            }
            Some(Frame::Chunk(_)) => Err(FetchError::BadResponse(
                "body arrived before response status".to_string(),
            )),
            None => {
                self.finished = true;
                Err(FetchError::Unreachable(
                    "fetch thread exited before a response".to_string(),
                ))
            }
        }
    }

    fn recv(&self) -> Option<Frame> {
        self.rx.as_ref().and_then(|rx| rx.recv().ok())
    }
}

impl ByteStream for CurlStream {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        while !self.finished {
            match self.recv() {
                Some(Frame::Chunk(bytes)) if bytes.is_empty() => continue,
                Some(Frame::Chunk(bytes)) => return Ok(Some(bytes)),
                Some(Frame::Status(_)) => continue,
                Some(Frame::Done(Ok(_))) => self.finished = true,
                Some(Frame::Done(Err(e))) => {
                    self.finished = true;
                    return Err(FetchError::Interrupted(e.to_string()));
                }
                None => {
                    self.finished = true;
                    return Err(FetchError::Interrupted(
                        "fetch thread ended without completing".to_string(),
                    ));
                }
            }
        }
        Ok(None)
    }
}

impl Drop for CurlStream {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
        drop(self.rx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("fetch thread panicked");
            }
        }
    }
}

fn perform(
    url: &str,
    start: u64,
    opts: CurlOptions,
    tx: &SyncSender<Frame>,
    closed: &AtomicBool,
) -> Result<u32, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    // curl renders "<start>-" as "Range: bytes=<start>-".
    easy.range(&format!("{}-", start))?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirections)?;
    easy.connect_timeout(opts.connect_timeout)?;
    if let Some(size) = opts.buffer_size {
        easy.buffer_size(size)?;
    }
    if let Some((limit, window)) = opts.low_speed {
        easy.low_speed_limit(limit)?;
        easy.low_speed_time(window)?;
    }
    easy.progress(true)?;

    let status = Cell::new(0u32);
    let announced = Cell::new(false);
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Some(code) = parse_status_line(data) {
                status.set(code);
            }
            true
        })?;
        transfer.write_function(|data| {
            if !announced.get() {
                announced.set(true);
                if tx.send(Frame::Status(status.get())).is_err() {
                    return Ok(0);
                }
            }
            match tx.send(Frame::Chunk(data.to_vec())) {
                Ok(()) => Ok(data.len()),
                // Consumer dropped the stream; a short count aborts the transfer.
                Err(_) => Ok(0),
            }
        })?;
        transfer.progress_function(|_, _, _, _| !closed.load(Ordering::Relaxed))?;
        transfer.perform()?;
    }
    easy.response_code()
}

/// `HTTP/1.1 206 Partial Content` -> `Some(206)`.
fn parse_status_line(data: &[u8]) -> Option<u32> {
    let line = str::from_utf8(data).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_codes() {
        assert_eq!(parse_status_line(b"HTTP/1.1 206 Partial Content\r\n"), Some(206));
        assert_eq!(parse_status_line(b"HTTP/2 200\r\n"), Some(200));
    }

    #[test]
    fn header_lines_are_not_status() {
        assert_eq!(parse_status_line(b"Content-Length: 10\r\n"), None);
        assert_eq!(parse_status_line(b"\r\n"), None);
        assert_eq!(parse_status_line(b"HTTP/1.1 abc\r\n"), None);
    }
}
