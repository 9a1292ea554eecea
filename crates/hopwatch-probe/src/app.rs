use std::time::{Duration, Instant};

use hopwatch_model::AppLatencySample;
use reqwest::blocking::Client;

use crate::error::ProbeError;

pub const APP_TIMEOUT: Duration = Duration::from_secs(5);

/// Times one GET against the monitored application, body download included.
pub struct AppLatencyProbe {
    client: Client,
    url: String,
}

impl AppLatencyProbe {
    pub fn new(url: impl Into<String>) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(APP_TIMEOUT)
            .build()
            .map_err(|err| ProbeError::NetworkFailure(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sample(&self) -> AppLatencySample {
        match self.try_sample() {
            Ok(latency_ms) => AppLatencySample::Measured(latency_ms),
            Err(err) => {
                tracing::warn!(url = %self.url, error = %err, "application probe failed");
                AppLatencySample::Failed
            }
        }
    }

    fn try_sample(&self) -> Result<f64, ProbeError> {
        let started = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|err| ProbeError::NetworkFailure(err.to_string()))?;
        let status = response.status();
        response
            .bytes()
            .map_err(|err| ProbeError::NetworkFailure(err.to_string()))?;
        let elapsed = started.elapsed();

        if !(status.is_success() || status.is_redirection()) {
            return Err(ProbeError::NetworkFailure(format!(
                "unexpected status {status}"
            )));
        }
        Ok(elapsed.as_secs_f64() * 1000.0)
    }
}
