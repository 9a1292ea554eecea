//! Network probes: external diagnostic commands, their output grammars, and host counters.

pub mod app;
pub mod enrich;
pub mod error;
pub mod netstats;
pub mod parser;
pub mod ping;
pub mod platform;
pub mod runner;
pub mod trace;

pub use app::AppLatencyProbe;
pub use enrich::{is_private_address, parse_whois, HopEnricher};
pub use error::ProbeError;
pub use netstats::{parse_proc_net_dev, InterfaceStatsReader};
pub use parser::{parse_hop_line, parse_trace_output, ParsedHop};
pub use ping::{parse_ping, PingProber};
pub use platform::Platform;
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use trace::PathTracer;
