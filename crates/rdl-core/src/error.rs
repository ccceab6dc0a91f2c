//! Error kinds shared by the probe, fetcher, writer and controller.
//!
//! `FetchError` is what the two network components return. The controller maps
//! every failure into a `TransferError` carrying an `ErrorKind`, which is what the
//! caller sees in the `Failed` terminal event.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure of a network component (probe or ranged fetch).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure before a response was received.
    #[error("unreachable: {0}")]
    Unreachable(String),
    /// Server answered but the response is unusable (non-2xx probe, no length).
    #[error("bad response: {0}")]
    BadResponse(String),
    /// Server did not honor partial content semantics for a ranged GET.
    #[error("server error: HTTP {0}")]
    ServerError(u32),
    /// Transport failed after the body started streaming.
    #[error("transfer interrupted: {0}")]
    Interrupted(String),
}

/// Classification of a failed transfer, reported with the `Failed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Zero or unknown total length, or a URL that cannot be requested.
    InvalidResource,
    Unreachable,
    BadResponse,
    ServerError,
    /// Local write failure or a transport failure mid-body.
    TransferIO,
    /// Remote size differs from the size the partial file was started against.
    ResourceChanged,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidResource => "invalid resource",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::BadResponse => "bad response",
            ErrorKind::ServerError => "server error",
            ErrorKind::TransferIO => "transfer I/O",
            ErrorKind::ResourceChanged => "resource changed",
        };
        f.write_str(s)
    }
}

/// Why a transfer ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransferError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransferError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Local I/O failure; keeps the full `anyhow` context chain in the message.
    pub fn io(err: &anyhow::Error) -> Self {
        Self::new(ErrorKind::TransferIO, format!("{:#}", err))
    }

    /// Maps a probe failure. A response without a usable length counts as a
    /// zero-length resource.
    pub fn from_probe(err: FetchError) -> Self {
        let kind = match err {
            FetchError::Unreachable(_) => ErrorKind::Unreachable,
            FetchError::BadResponse(_) => ErrorKind::InvalidResource,
            FetchError::ServerError(_) => ErrorKind::ServerError,
            FetchError::Interrupted(_) => ErrorKind::TransferIO,
        };
        Self::new(kind, err.to_string())
    }

    /// Maps a fetch or stream failure.
    pub fn from_fetch(err: FetchError) -> Self {
        let kind = match err {
            FetchError::Unreachable(_) => ErrorKind::Unreachable,
            FetchError::BadResponse(_) => ErrorKind::BadResponse,
            FetchError::ServerError(_) => ErrorKind::ServerError,
            FetchError::Interrupted(_) => ErrorKind::TransferIO,
        };
        Self::new(kind, err.to_string())
    }
}
