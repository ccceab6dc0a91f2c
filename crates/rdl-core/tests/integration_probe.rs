//! Integration tests: `CurlProbe` against a local range server.

mod common;

use std::time::{Duration, Instant};

use common::range_server::{self, RangeServerOptions};
use rdl_core::config::CurlOptions;
use rdl_core::error::FetchError;
use rdl_core::fetch_head::{ContentProbe, CurlProbe};

#[test]
fn head_reports_size_and_validators() {
    let server = range_server::start_with_options(
        vec![7u8; 5000],
        RangeServerOptions {
            etag: Some("v1-abc"),
            ..RangeServerOptions::default()
        },
    );
    let (total, head) = CurlProbe::new(CurlOptions::default())
        .probe_head(&server.url)
        .unwrap();
    assert_eq!(total, 5000);
    assert!(head.accept_ranges);
    assert_eq!(head.etag.as_deref(), Some("v1-abc"));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn fallback_reads_total_from_content_range() {
    let server = range_server::start_with_options(
        vec![1u8; 4096],
        RangeServerOptions {
            head_status: "501 Not Implemented",
            ..RangeServerOptions::default()
        },
    );
    let probe = CurlProbe::new(CurlOptions::default());
    assert_eq!(probe.probe(&server.url), Ok(4096));
    assert_eq!(server.get_ranges(), vec![Some("bytes=0-0".to_string())]);
}

#[test]
fn fallback_stops_reading_when_range_is_ignored() {
    // 256 pieces at 20ms each: reading the whole body would take over 5s.
    let server = range_server::start_with_options(
        vec![3u8; 256 * 1024],
        RangeServerOptions {
            head_status: "405 Method Not Allowed",
            support_ranges: false,
            piece: 1024,
            piece_delay: Some(Duration::from_millis(20)),
            ..RangeServerOptions::default()
        },
    );
    let probe = CurlProbe::new(CurlOptions::default());
    let started = Instant::now();
    assert_eq!(probe.probe(&server.url), Ok(256 * 1024));
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "probe read the body: {:?}",
        started.elapsed()
    );
}

#[test]
fn other_head_errors_are_bad_response() {
    let server = range_server::start_with_options(
        vec![1u8; 10],
        RangeServerOptions {
            head_status: "404 Not Found",
            ..RangeServerOptions::default()
        },
    );
    let probe = CurlProbe::new(CurlOptions::default());
    assert_eq!(
        probe.probe(&server.url),
        Err(FetchError::BadResponse("HTTP 404".to_string()))
    );
    assert!(server.get_ranges().is_empty());
}
