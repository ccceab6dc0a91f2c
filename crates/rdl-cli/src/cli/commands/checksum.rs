//! `rdl checksum` – print or verify the SHA-256 of a local file.

use anyhow::Result;
use rdl_core::checksum;
use std::path::Path;

/// Prints `<digest>  <path>`; with `expected`, fails on mismatch instead.
pub async fn run_checksum(path: &Path, expected: Option<&str>) -> Result<()> {
    match expected {
        Some(hex) => {
            checksum::verify_sha256(path, hex)?;
            println!("OK  {}", path.display());
        }
        None => println!("{}  {}", checksum::sha256_path(path)?, path.display()),
    }
    Ok(())
}
