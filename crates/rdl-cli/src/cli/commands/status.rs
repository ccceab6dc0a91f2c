//! `rdl status` – remote size vs. local partial file.

use anyhow::Result;
use rdl_core::config::{CurlOptions, RdlConfig};
use rdl_core::fetch_head::{ContentProbe, CurlProbe};
use rdl_core::storage;
use rdl_core::transfer::percent;
use std::path::Path;

/// Local file state relative to the remote size.
fn describe(local: u64, total: u64, exists: bool) -> &'static str {
    if !exists {
        "missing"
    } else if local == total {
        "complete"
    } else if local > total {
        "larger than remote"
    } else {
        "partial"
    }
}

pub async fn run_status(cfg: &RdlConfig, url: &str, target: &Path, json: bool) -> Result<()> {
    let probe = CurlProbe::new(CurlOptions::from(cfg));
    let remote_url = url.to_string();
    let total = tokio::task::spawn_blocking(move || probe.probe(&remote_url)).await??;
    let exists = target.exists();
    let local = storage::existing_len(target)?;
    let state = describe(local, total, exists);
    let pct = percent(local.min(total), total);

    if json {
        let value = serde_json::json!({
            "url": url,
            "path": target.display().to_string(),
            "total_bytes": total,
            "local_bytes": local,
            "percent": pct,
            "state": state,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{:<10} {:<12} {:<12} {:<5} {}", "STATE", "LOCAL", "REMOTE", "PCT", "PATH");
        println!(
            "{:<10} {:<12} {:<12} {:<5} {}",
            state,
            local,
            total,
            format!("{}%", pct),
            target.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::describe;

    #[test]
    fn describe_states() {
        assert_eq!(describe(0, 10, false), "missing");
        assert_eq!(describe(4, 10, true), "partial");
        assert_eq!(describe(10, 10, true), "complete");
        assert_eq!(describe(12, 10, true), "larger than remote");
    }
}
