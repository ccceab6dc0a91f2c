//! Tests for `rdl get` argument parsing and target resolution.

use super::parse;
use crate::cli::{resolve_target, Cli, CliCommand};
use clap::Parser;
use rdl_core::config::RdlConfig;
use std::path::PathBuf;

#[test]
fn cli_parse_get_defaults() {
    match parse(&["rdl", "get", "https://example.com/a.iso"]) {
        CliCommand::Get {
            url,
            output,
            dir,
            force_restart,
            restart_without_ranges,
            sha256,
        } => {
            assert_eq!(url, "https://example.com/a.iso");
            assert!(output.is_none());
            assert!(dir.is_none());
            assert!(!force_restart);
            assert!(!restart_without_ranges);
            assert!(sha256.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_all_flags() {
    match parse(&[
        "rdl",
        "get",
        "https://example.com/a.iso",
        "-o",
        "/tmp/a.iso",
        "--force-restart",
        "--restart-without-ranges",
        "--sha256",
        "abc123",
    ]) {
        CliCommand::Get {
            output,
            force_restart,
            restart_without_ranges,
            sha256,
            ..
        } => {
            assert_eq!(output, Some(PathBuf::from("/tmp/a.iso")));
            assert!(force_restart);
            assert!(restart_without_ranges);
            assert_eq!(sha256.as_deref(), Some("abc123"));
        }
        _ => panic!("expected Get with flags"),
    }
}

#[test]
fn cli_parse_get_dir() {
    match parse(&["rdl", "get", "https://example.com/a.iso", "--dir", "/data"]) {
        CliCommand::Get { dir, output, .. } => {
            assert_eq!(dir, Some(PathBuf::from("/data")));
            assert!(output.is_none());
        }
        _ => panic!("expected Get with --dir"),
    }
}

#[test]
fn cli_parse_get_requires_url() {
    assert!(Cli::try_parse_from(["rdl", "get"]).is_err());
}

#[test]
fn target_prefers_output_then_dir_then_config() {
    let url = "https://example.com/files/a.iso";
    let cfg = RdlConfig {
        download_dir: Some(PathBuf::from("/cfg")),
        ..RdlConfig::default()
    };

    let explicit = resolve_target(&cfg, url, Some(PathBuf::from("/x/y.bin")), None).unwrap();
    assert_eq!(explicit, PathBuf::from("/x/y.bin"));

    let in_dir = resolve_target(&cfg, url, None, Some(std::path::Path::new("/d"))).unwrap();
    assert_eq!(in_dir, PathBuf::from("/d/a.iso"));

    let from_cfg = resolve_target(&cfg, url, None, None).unwrap();
    assert_eq!(from_cfg, PathBuf::from("/cfg/a.iso"));
}

#[test]
fn target_falls_back_to_current_dir() {
    let target = resolve_target(&RdlConfig::default(), "https://example.com/", None, None).unwrap();
    assert_eq!(target, std::env::current_dir().unwrap().join("download.bin"));
}
