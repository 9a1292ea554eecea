use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use hopwatch_model::HopRecord;

use crate::enrich::HopEnricher;
use crate::error::ProbeError;
use crate::parser::{parse_trace_output, ParsedHop};
use crate::platform::Platform;
use crate::runner::CommandRunner;

pub const TRACE_TIMEOUT: Duration = Duration::from_secs(10);
pub const PER_HOP_TIMEOUT: Duration = Duration::from_secs(1);

pub struct PathTracer {
    runner: Arc<dyn CommandRunner>,
    platform: Platform,
    enricher: HopEnricher,
    audit_log: Option<PathBuf>,
    timeout: Duration,
}

impl PathTracer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Platform,
        enricher: HopEnricher,
        audit_log: Option<PathBuf>,
    ) -> Self {
        Self {
            runner,
            platform,
            enricher,
            audit_log,
            timeout: TRACE_TIMEOUT,
        }
    }

    /// Always returns at least one hop; total failure is the synthetic failure hop.
    /// Any captured output goes to the audit log, even from a failed run.
    pub fn trace(&self, host: &str) -> Vec<HopRecord> {
        let (program, args) = self.platform.trace_command(host, PER_HOP_TIMEOUT);
        let output = match self.runner.run(program, &args, self.timeout) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(host, error = %err, "path discovery failed");
                return vec![HopRecord::trace_failed()];
            }
        };

        if !output.stdout.is_empty() {
            self.audit(host, &output.stdout);
        }

        if !output.exit_ok {
            let err = ProbeError::CommandFailed {
                program: program.to_string(),
            };
            tracing::warn!(host, error = %err, "path discovery failed");
            return vec![HopRecord::trace_failed()];
        }

        let hops: Vec<HopRecord> = parse_trace_output(self.platform, &output.stdout)
            .into_iter()
            .map(|parsed| self.to_record(parsed))
            .collect();

        if hops.is_empty() {
            tracing::warn!(host, "path discovery output had no recognizable hops");
            return vec![HopRecord::trace_failed()];
        }
        hops
    }

    fn audit(&self, host: &str, raw: &str) {
        if let Some(path) = &self.audit_log {
            if let Err(err) = append_raw_output(path, host, raw) {
                tracing::warn!(path = %path.display(), error = %err, "failed to write trace log");
            }
        }
    }

    fn to_record(&self, parsed: ParsedHop) -> HopRecord {
        match parsed {
            ParsedHop::Reached {
                hop_index,
                hostname,
                ip,
                latency_ms,
            } => {
                let ownership = self.enricher.enrich(&ip);
                HopRecord {
                    hop_index,
                    hostname,
                    ip,
                    latency_ms: Some(latency_ms),
                    ownership,
                }
            }
            ParsedHop::TimedOut { hop_index } => HopRecord::timed_out(hop_index),
        }
    }
}

fn append_raw_output(path: &Path, host: &str, raw: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "\n--- Traceroute to {host} at {} ---",
        Local::now().format("%Y-%m-%d %H:%M:%S%.6f")
    )?;
    file.write_all(raw.as_bytes())
}
