//! Error types for the bridge.
//!
//! Per-file analysis failures are recovered inside a session, session failures end
//! one call, bridge failures end the process.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single file could not be analyzed. Never escalates past the session.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("cannot read {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no analysis engine is configured")]
    EngineUnavailable,

    #[error("analysis engine failed on {path}: {source}")]
    EngineFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("analysis engine produced invalid output for {path}: {source}")]
    InvalidEngineOutput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of one AnalyzeProject call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("response stream closed by the caller")]
    StreamClosed,
}

/// Process level failures: configuration and listener setup.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}
