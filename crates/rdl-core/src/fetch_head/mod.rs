//! ContentProbe: metadata-only request that discovers the total resource size.
//!
//! `CurlProbe` issues a HEAD (libcurl `nobody`). Servers that reject HEAD with
//! 405/501 get a one-byte ranged GET instead, and the size is read from
//! `Content-Range`. No retries happen here; failures go straight to the caller.

mod parse;

pub use parse::{parse_headers, HeadResult};

use crate::config::CurlOptions;
use crate::error::FetchError;
use std::str;

/// Discovers the declared length of a remote resource.
pub trait ContentProbe: Send + Sync {
    /// Returns the total size in bytes. `Ok(0)` means the server declared an
    /// empty body; `BadResponse` means no usable length was declared.
    fn probe(&self, url: &str) -> Result<u64, FetchError>;
}

/// libcurl-backed probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlProbe {
    opts: CurlOptions,
}

impl CurlProbe {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    /// Total size plus the headers it was read from, falling back to a
    /// ranged GET when HEAD is rejected.
    pub fn probe_head(&self, url: &str) -> Result<(u64, HeadResult), FetchError> {
        let (code, head) = self.request(url, true)?;
        let (code, head) = if code == 405 || code == 501 {
            tracing::debug!(url, code, "HEAD rejected, probing with ranged GET");
            self.request(url, false)?
        } else {
            (code, head)
        };
        let total = total_from_response(code, &head)?;
        tracing::debug!(url, total, accept_ranges = head.accept_ranges, "probe complete");
        Ok((total, head))
    }

    fn request(&self, url: &str, head: bool) -> Result<(u32, HeadResult), FetchError> {
        let unreachable = |e: curl::Error| FetchError::Unreachable(e.to_string());
        let mut lines: Vec<String> = Vec::new();
        let mut body_cut = false;

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(unreachable)?;
        if head {
            easy.nobody(true).map_err(unreachable)?;
        } else {
            easy.range("0-0").map_err(unreachable)?;
        }
        easy.follow_location(true).map_err(unreachable)?;
        easy.max_redirections(self.opts.max_redirections)
            .map_err(unreachable)?;
        easy.connect_timeout(self.opts.connect_timeout)
            .map_err(unreachable)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        let line = s.trim_end();
                        // A new status line starts the headers of a redirect target.
                        if line.starts_with("HTTP/") {
                            lines.clear();
                        }
                        lines.push(line.to_string());
                    }
                    true
                })
                .map_err(unreachable)?;
            // Headers are all we need. Refusing the first body write stops a
            // server that ignored `bytes=0-0` from sending the whole resource.
            transfer
                .write_function(|_| {
                    body_cut = true;
                    Ok(0)
                })
                .map_err(unreachable)?;
            let performed = transfer.perform();
            drop(transfer);
            match performed {
                Ok(()) => {}
                Err(e) if e.is_write_error() && body_cut => {}
                Err(e) => return Err(unreachable(e)),
            }
        }

        let code = easy.response_code().map_err(unreachable)?;
        Ok((code, parse_headers(&lines)))
    }
}

impl ContentProbe for CurlProbe {
    fn probe(&self, url: &str) -> Result<u64, FetchError> {
        self.probe_head(url).map(|(total, _)| total)
    }
}

/// Picks the total size out of a probe response.
fn total_from_response(code: u32, head: &HeadResult) -> Result<u64, FetchError> {
    if !(200..300).contains(&code) {
        return Err(FetchError::BadResponse(format!("HTTP {}", code)));
    }
    let total = if code == 206 {
        head.content_range_total
    } else {
        head.content_length
    };
    total.ok_or_else(|| FetchError::BadResponse("no usable content length".to_string()))
}
