use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};

use crate::error::MetricsError;
use crate::publisher::Exposition;

/// Scrape endpoint running on its own thread and runtime, independent of the
/// sampling loop.
pub struct MetricsServer {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl MetricsServer {
    /// Binds before returning so a taken port is a startup error, not a log line.
    pub fn start(addr: SocketAddr, exposition: Exposition) -> Result<Self, MetricsError> {
        let bind_err = |source| MetricsError::Bind { addr, source };

        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
            .map_err(MetricsError::Runtime)?;

        let handle = thread::Builder::new()
            .name("metrics-http".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let listener = match tokio::net::TcpListener::from_std(listener) {
                        Ok(listener) => listener,
                        Err(err) => {
                            tracing::error!(error = %err, "metrics listener setup failed");
                            return;
                        }
                    };
                    if let Err(err) = axum::serve(listener, router(exposition)).await {
                        tracing::error!(error = %err, "metrics endpoint stopped");
                    }
                });
            })
            .map_err(MetricsError::Runtime)?;

        tracing::info!(addr = %local_addr, "metrics endpoint listening");
        Ok(Self {
            addr: local_addr,
            _handle: handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

pub fn router(exposition: Exposition) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(exposition)
}

async fn metrics(State(exposition): State<Exposition>) -> impl IntoResponse {
    let body = exposition.load();
    (
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body.as_str().to_owned(),
    )
}

async fn healthz() -> &'static str {
    "ok"
}
