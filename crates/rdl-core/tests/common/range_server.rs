//! Minimal HTTP/1.1 server that supports HEAD and open-ended Range GET for integration tests.
//!
//! Serves a single static body. Responds to HEAD with Content-Length and
//! Accept-Ranges: bytes; responds to GET with Range with 206 Partial Content.
//! Every request's method and Range header are recorded.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// Status line for HEAD. Anything but `200 OK` is sent without headers
    /// (servers that block HEAD with 405 or 501).
    pub head_status: &'static str,
    /// Sent as `ETag` on HEAD and GET when set.
    pub etag: Option<&'static str>,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Body is written in pieces of this size with `piece_delay` between them.
    pub piece: usize,
    pub piece_delay: Option<Duration>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_status: "200 OK",
            etag: None,
            support_ranges: true,
            piece: 16 * 1024,
            piece_delay: None,
        }
    }
}

/// A recorded request: method and raw Range header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: String,
    pub range: Option<String>,
}

pub struct RangeServer {
    pub url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Range headers of all GET requests, in order.
    pub fn get_ranges(&self) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .filter(|s| s.method == "GET")
            .map(|s| s.range)
            .collect()
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Starts a server in a background thread serving `body` at `/file.bin`.
/// The server runs until the process exits.
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_server = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let seen = Arc::clone(&seen_in_server);
            thread::spawn(move || handle(stream, &body, opts, &seen));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{}/file.bin", port),
        seen,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, seen: &Mutex<Vec<Seen>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, range_raw, range) = parse_request(request);
    seen.lock().unwrap().push(Seen {
        method: method.to_string(),
        range: range_raw.clone(),
    });
    let total = body.len() as u64;
    let etag = opts
        .etag
        .map(|v| format!("ETag: \"{}\"\r\n", v))
        .unwrap_or_default();

    if method.eq_ignore_ascii_case("HEAD") {
        if opts.head_status != "200 OK" {
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                opts.head_status
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\n{}Connection: close\r\n\r\n",
            total, etag
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ =
            stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (status, content_range, slice) = match range.filter(|_| opts.support_ranges) {
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start >= total || start > end_incl {
                (
                    "416 Range Not Satisfiable",
                    Some(format!("bytes */{}", total)),
                    &body[0..0],
                )
            } else {
                let slice = &body[start as usize..=end_incl as usize];
                (
                    "206 Partial Content",
                    Some(format!("bytes {}-{}/{}", start, end_incl, total)),
                    slice,
                )
            }
        }
        None => ("200 OK", None, body),
    };
    let content_range = content_range
        .map(|v| format!("Content-Range: {}\r\n", v))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        etag
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for piece in slice.chunks(opts.piece.max(1)) {
        if stream.write_all(piece).is_err() {
            return;
        }
        if let Some(delay) = opts.piece_delay {
            thread::sleep(delay);
        }
    }
}

/// Returns (method, raw Range value, parsed (start, end_inclusive)) for `Range: bytes=X-[Y]`.
fn parse_request(request: &str) -> (&str, Option<String>, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let mut raw = None;
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let value = value.trim();
        raw = Some(value.to_string());
        if let Some(ranges) = value.strip_prefix("bytes=") {
            if let Some((a, b)) = ranges.split_once('-') {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim();
                let end_incl = if end.is_empty() {
                    u64::MAX
                } else {
                    end.parse::<u64>().unwrap_or(0)
                };
                range = Some((start, end_incl));
            }
        }
    }
    (method, raw, range)
}
