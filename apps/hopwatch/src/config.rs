use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "hopwatch",
    version,
    about = "Watch reachability, path and latency to an internet host and expose them as Prometheus metrics."
)]
pub struct Config {
    /// Host used for ping and path discovery.
    #[arg(long, env = "HOPWATCH_HOST", default_value = "8.8.8.8")]
    pub host: String,

    /// URL whose response time is measured each cycle.
    #[arg(long, env = "HOPWATCH_APP_URL", default_value = "https://www.google.com")]
    pub app_url: String,

    #[arg(long, env = "HOPWATCH_LOG", default_value = "connection_log.txt")]
    pub log_path: PathBuf,

    /// Raw path discovery output is appended here every cycle.
    #[arg(long, env = "HOPWATCH_TRACE_LOG", default_value = "traceroute_log.txt")]
    pub trace_log_path: PathBuf,

    #[arg(long, env = "HOPWATCH_INTERVAL_SECS", default_value_t = 10)]
    pub interval_secs: u64,

    #[arg(long, env = "HOPWATCH_METRICS_PORT", default_value_t = 8000)]
    pub metrics_port: u16,

    /// Echo every diagnostic command before running it.
    #[arg(long, env = "HOPWATCH_VERBOSE", default_value_t = true, action = ArgAction::Set)]
    pub verbose: bool,

    #[arg(long, env = "HOPWATCH_SOUND", default_value_t = true, action = ArgAction::Set)]
    pub sound: bool,

    #[arg(long, env = "HOPWATCH_YELLOW_SOUND", default_value = "yellow_alert.wav")]
    pub yellow_sound: PathBuf,

    #[arg(long, env = "HOPWATCH_RED_SOUND", default_value = "red_alert.wav")]
    pub red_sound: PathBuf,

    /// Disable ANSI colors on the console.
    #[arg(long)]
    pub plain: bool,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
