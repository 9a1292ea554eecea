use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric registration failed: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("metric text was not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
