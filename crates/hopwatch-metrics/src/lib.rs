//! Gauge registry for the latest cycle and the HTTP endpoint that serves it.

pub mod error;
pub mod publisher;
pub mod server;

pub use error::MetricsError;
pub use publisher::{Exposition, MetricsPublisher, NetworkMetrics};
pub use server::MetricsServer;
