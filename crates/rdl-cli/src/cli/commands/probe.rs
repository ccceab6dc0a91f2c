//! `rdl probe` – print the remote size of a URL.

use anyhow::Result;
use rdl_core::config::{CurlOptions, RdlConfig};
use rdl_core::fetch_head::CurlProbe;

pub async fn run_probe(cfg: &RdlConfig, url: &str, json: bool) -> Result<()> {
    let probe = CurlProbe::new(CurlOptions::from(cfg));
    let target = url.to_string();
    let (total, head) =
        tokio::task::spawn_blocking(move || probe.probe_head(&target)).await??;

    if json {
        let value = serde_json::json!({
            "url": url,
            "total_bytes": total,
            "accept_ranges": head.accept_ranges,
            "etag": head.etag,
            "last_modified": head.last_modified,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let ranges = if head.accept_ranges {
            "yes"
        } else {
            "not advertised"
        };
        println!("{} bytes  (ranges: {})  {}", total, ranges, url);
        if let Some(etag) = &head.etag {
            println!("  ETag: {}", etag);
        }
        if let Some(modified) = &head.last_modified {
            println!("  Last-Modified: {}", modified);
        }
    }
    Ok(())
}
