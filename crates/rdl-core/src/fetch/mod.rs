//! RangeFetcher: ranged GET exposed as a pull-based byte stream.
//!
//! The request carries an open-ended `Range: bytes=<start>-`. A `206` is the
//! normal answer; a `200` is only acceptable when `start == 0`, otherwise the
//! server ignored the range and `ServerError` is returned so the caller can
//! decide whether to restart from zero.

mod pump;

use crate::config::CurlOptions;
use crate::error::FetchError;

pub use pump::CurlStream;

/// Chunks buffered between the curl thread and the consumer.
const QUEUE_DEPTH: usize = 8;

/// Lazy, finite sequence of body chunks. Not restartable; dropping it releases
/// the underlying connection.
pub trait ByteStream: Send {
    /// Next chunk, `Ok(None)` once the body is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError>;
}

/// Issues the ranged GET.
pub trait RangeFetcher: Send + Sync {
    fn fetch(&self, url: &str, start: u64) -> Result<Box<dyn ByteStream>, FetchError>;
}

/// True if `code` honors a range request starting at `start`.
pub fn honors_range(code: u32, start: u64) -> bool {
    code == 206 || (code == 200 && start == 0)
}

/// libcurl-backed fetcher; each call runs its transfer on a companion thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlFetcher {
    opts: CurlOptions,
}

impl CurlFetcher {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

impl RangeFetcher for CurlFetcher {
    fn fetch(&self, url: &str, start: u64) -> Result<Box<dyn ByteStream>, FetchError> {
        let mut stream = CurlStream::spawn(url, start, self.opts, QUEUE_DEPTH)?;
        let code = stream.await_status()?;
        if !honors_range(code, start) {
            tracing::warn!(url, start, code, "server did not honor range request");
            return Err(FetchError::ServerError(code));
        }
        tracing::debug!(url, start, code, "range fetch started");
        Ok(Box::new(stream))
    }
}
