//! CLI for the RDL resumable downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rdl_core::config::{self, RdlConfig};
use rdl_core::url_model;
use std::path::{Path, PathBuf};

use commands::{run_checksum, run_discard, run_get, run_probe, run_status, GetOptions};

/// Top-level CLI for the RDL resumable downloader.
#[derive(Debug, Parser)]
#[command(name = "rdl")]
#[command(about = "RDL: single-connection resumable HTTP downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, resuming from an existing partial file.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Target file. Defaults to the URL's file name inside --dir.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Directory for the default target name (overrides config download_dir).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// If the remote size changed since the partial file was written, start over.
        #[arg(long)]
        force_restart: bool,

        /// If the server ignores the Range header, restart from zero instead of failing.
        #[arg(long)]
        restart_without_ranges: bool,

        /// Expected SHA-256 (hex) of the completed file.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// Print the remote size of a URL.
    Probe {
        url: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compare the remote size with the local partial file.
    Status {
        url: String,

        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Delete a partial file.
    Discard {
        /// Path to the partial file.
        path: PathBuf,
    },

    /// Print the SHA-256 of a file, or check it against an expected digest.
    Checksum {
        /// Path to the file.
        path: PathBuf,

        /// Expected SHA-256 (hex); exit non-zero on mismatch.
        #[arg(long, value_name = "HEX")]
        expect: Option<String>,
    },
}

impl CliCommand {
    /// Parses arguments, runs the command and returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                output,
                dir,
                force_restart,
                restart_without_ranges,
                sha256,
            } => {
                let target = resolve_target(&cfg, &url, output, dir.as_deref())?;
                let opts = GetOptions {
                    force_restart,
                    restart_without_ranges,
                    sha256,
                };
                return run_get(&cfg, url, target, opts).await;
            }
            CliCommand::Probe { url, json } => run_probe(&cfg, &url, json).await?,
            CliCommand::Status {
                url,
                output,
                dir,
                json,
            } => {
                let target = resolve_target(&cfg, &url, output, dir.as_deref())?;
                run_status(&cfg, &url, &target, json).await?;
            }
            CliCommand::Discard { path } => run_discard(&path).await?,
            CliCommand::Checksum { path, expect } => {
                run_checksum(&path, expect.as_deref()).await?;
            }
        }

        Ok(0)
    }
}

/// `-o` wins; otherwise the URL's file name under `--dir`, config `download_dir`, or the cwd.
fn resolve_target(
    cfg: &RdlConfig,
    url: &str,
    output: Option<PathBuf>,
    dir: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path);
    }
    let dir = match dir.or(cfg.download_dir.as_deref()) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(url_model::target_in_dir(&dir, url))
}

#[cfg(test)]
mod tests;
