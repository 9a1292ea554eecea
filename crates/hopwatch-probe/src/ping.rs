use std::sync::{Arc, OnceLock};
use std::time::Duration;

use hopwatch_model::ProbeResult;
use regex::Regex;

use crate::error::ProbeError;
use crate::platform::Platform;
use crate::runner::CommandRunner;

pub const PING_COUNT: u32 = 4;
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

static UNIX_LOSS: OnceLock<Regex> = OnceLock::new();
static UNIX_AVG: OnceLock<Regex> = OnceLock::new();
static WINDOWS_LOSS: OnceLock<Regex> = OnceLock::new();
static WINDOWS_AVG: OnceLock<Regex> = OnceLock::new();

pub struct PingProber {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    timeout: Duration,
}

impl PingProber {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: Platform) -> Self {
        Self {
            runner,
            platform,
            timeout: PING_TIMEOUT,
        }
    }

    /// Never fails: anything short of a parseable summary is reported as total loss.
    pub fn probe(&self, host: &str) -> ProbeResult {
        match self.try_probe(host) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(host, error = %err, "ping probe failed");
                ProbeResult::failed()
            }
        }
    }

    fn try_probe(&self, host: &str) -> Result<ProbeResult, ProbeError> {
        let (program, args) = self.platform.ping_command(host, PING_COUNT);
        let output = self.runner.run(program, &args, self.timeout)?;
        self.platform.parse_ping(&output.stdout)
    }
}

pub fn parse_ping(platform: Platform, text: &str) -> Result<ProbeResult, ProbeError> {
    platform.parse_ping(text)
}

/// Linux iputils, BSD/macOS and busybox summaries.
pub(crate) fn parse_unix(text: &str) -> Result<ProbeResult, ProbeError> {
    let loss_re = UNIX_LOSS
        .get_or_init(|| Regex::new(r"([\d.]+)% packet loss").expect("valid loss regex"));
    let avg_re = UNIX_AVG.get_or_init(|| {
        Regex::new(r"min/avg/max(?:/[a-z]+)? = [\d.]+/([\d.]+)/").expect("valid avg regex")
    });
    parse_with(text, loss_re, avg_re)
}

pub(crate) fn parse_windows(text: &str) -> Result<ProbeResult, ProbeError> {
    let loss_re = WINDOWS_LOSS
        .get_or_init(|| Regex::new(r"\(([\d.]+)% loss\)").expect("valid loss regex"));
    let avg_re = WINDOWS_AVG
        .get_or_init(|| Regex::new(r"Average = ([\d.]+)ms").expect("valid avg regex"));
    parse_with(text, loss_re, avg_re)
}

fn parse_with(text: &str, loss_re: &Regex, avg_re: &Regex) -> Result<ProbeResult, ProbeError> {
    let loss = loss_re
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|loss| loss.is_finite() && *loss >= 0.0)
        .ok_or(ProbeError::ParseMismatch { what: "ping" })?;

    let avg = avg_re
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok());

    Ok(ProbeResult::new(loss.round() as u32, avg))
}
