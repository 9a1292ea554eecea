use std::time::Duration;

use hopwatch_model::ProbeResult;

use crate::error::ProbeError;
use crate::parser::{self, ParsedHop};
use crate::ping;

/// The OS family whose diagnostic tools we drive. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn ping_command(self, host: &str, count: u32) -> (&'static str, Vec<String>) {
        let count_flag = match self {
            Platform::Windows => "-n",
            Platform::Linux | Platform::MacOs => "-c",
        };
        (
            "ping",
            vec![count_flag.to_string(), count.to_string(), host.to_string()],
        )
    }

    pub fn trace_command(
        self,
        host: &str,
        per_hop_timeout: Duration,
    ) -> (&'static str, Vec<String>) {
        match self {
            Platform::Windows => (
                "tracert",
                vec![
                    "-w".to_string(),
                    per_hop_timeout.as_millis().max(1).to_string(),
                    host.to_string(),
                ],
            ),
            Platform::Linux | Platform::MacOs => (
                "traceroute",
                vec![
                    "-w".to_string(),
                    per_hop_timeout.as_secs().max(1).to_string(),
                    host.to_string(),
                ],
            ),
        }
    }

    pub fn parse_ping(self, text: &str) -> Result<ProbeResult, ProbeError> {
        match self {
            Platform::Windows => ping::parse_windows(text),
            Platform::Linux | Platform::MacOs => ping::parse_unix(text),
        }
    }

    pub fn parse_hop_line(self, line: &str) -> Option<ParsedHop> {
        match self {
            Platform::Windows => parser::parse_windows_hop_line(line),
            Platform::Linux | Platform::MacOs => parser::parse_unix_hop_line(line),
        }
    }
}
