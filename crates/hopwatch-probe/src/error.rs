use std::time::Duration;

use thiserror::Error;

/// Why a probe produced no data. Every probe converts these into its own default value.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{program} is not installed or not on PATH")]
    CommandUnavailable { program: String },

    #[error("{program} did not finish within {timeout:?}")]
    CommandTimeout { program: String, timeout: Duration },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited unsuccessfully")]
    CommandFailed { program: String },

    #[error("output did not match any known {what} format")]
    ParseMismatch { what: &'static str },

    #[error("http probe failed: {0}")]
    NetworkFailure(String),

    #[error("ownership lookup failed for {ip}: {reason}")]
    LookupFailure { ip: String, reason: String },
}
