use crossterm::style::{style, Color, Stylize};
use hopwatch_model::{AppLatencySample, CycleSnapshot, Severity};

const RULE: &str = "--------------------------------------------";

#[derive(Debug, Clone, Copy)]
pub struct ReportOpts {
    pub plain: bool,
}

/// Human-readable cycle report. The same text goes to the console and the log file.
pub fn render_report(snapshot: &CycleSnapshot, host: &str, app_url: &str) -> String {
    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(snapshot.timestamp.clone());
    lines.push(RULE.to_string());

    let ping = &snapshot.ping;
    if ping.success {
        let latency = match ping.avg_latency_ms {
            Some(ms) => format!("Latency is at {ms}ms"),
            None => "Latency is unknown".to_string(),
        };
        lines.push(format!(
            "- The internet connection is STABLE. {latency} with {}% packet loss.",
            ping.packet_loss_pct
        ));
    } else {
        lines.push(format!(
            "- The internet connection is DOWN. There is {}% packet loss to the internet, indicating a complete outage.",
            ping.packet_loss_pct
        ));
    }

    match snapshot.app_latency {
        AppLatencySample::Measured(ms) => lines.push(format!(
            "- The application response time for {app_url} is {ms:.2}ms."
        )),
        AppLatencySample::Failed => lines.push(format!(
            "- Failed to get application response time for {app_url}."
        )),
    }

    if !snapshot.hops.is_empty() {
        lines.push(String::new());
        lines.push(format!("Path to {host}:"));
        for hop in &snapshot.hops {
            match hop.latency_ms {
                Some(ms) => lines.push(format!(
                    "  Hop {}: {} ({}) ({ms}ms)",
                    hop.hop_index, hop.hostname, hop.ip
                )),
                None => lines.push(format!(
                    "  Hop {}: {} ({})",
                    hop.hop_index, hop.hostname, hop.ip
                )),
            }
            if hop.ownership.is_known() {
                lines.push(format!(
                    "    - Owned by: {}, Country: {}",
                    hop.ownership.org_name, hop.ownership.country
                ));
            }
        }
    }

    lines.join("\n")
}

pub fn colorize(report: &str, severity: Severity, opts: &ReportOpts) -> String {
    if opts.plain {
        return report.to_string();
    }
    let color = match severity {
        Severity::Nominal => Color::Green,
        Severity::Degraded => Color::Yellow,
        Severity::Outage => Color::Red,
    };
    style(report).with(color).to_string()
}
