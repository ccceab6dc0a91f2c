//! `rdl discard` – delete a partial file.

use anyhow::Result;
use rdl_core::storage;
use std::path::Path;

pub async fn run_discard(path: &Path) -> Result<()> {
    if !path.exists() {
        println!("Nothing to discard at {}.", path.display());
        return Ok(());
    }
    let len = storage::existing_len(path)?;
    storage::discard(path)?;
    println!("Discarded {} ({} bytes).", path.display(), len);
    Ok(())
}
