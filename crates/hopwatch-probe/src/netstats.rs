use hopwatch_model::InterfaceStats;
use sysinfo::Networks;

#[cfg(target_os = "linux")]
const PROC_NET_DEV: &str = "/proc/net/dev";

/// Cumulative counters summed over every interface, loopback included.
#[derive(Debug, Default)]
pub struct InterfaceStatsReader;

impl InterfaceStatsReader {
    pub fn new() -> Self {
        Self
    }

    /// Zero for all three counters when the OS gives us nothing usable.
    pub fn read(&self) -> InterfaceStats {
        match self.try_read() {
            Some(stats) => stats,
            None => {
                tracing::warn!("could not read network interface counters");
                InterfaceStats::default()
            }
        }
    }

    fn try_read(&self) -> Option<InterfaceStats> {
        let networks = Networks::new_with_refreshed_list();
        if networks.iter().next().is_none() {
            return None;
        }

        let mut stats = InterfaceStats::default();
        for (_name, data) in &networks {
            stats.bytes_received = stats.bytes_received.saturating_add(data.total_received());
            stats.bytes_transmitted = stats
                .bytes_transmitted
                .saturating_add(data.total_transmitted());
        }
        stats.packets_dropped = read_dropped()?;
        Some(stats)
    }
}

#[cfg(target_os = "linux")]
fn read_dropped() -> Option<u64> {
    let text = std::fs::read_to_string(PROC_NET_DEV).ok()?;
    parse_proc_net_dev(&text).map(|stats| stats.packets_dropped)
}

#[cfg(not(target_os = "linux"))]
fn read_dropped() -> Option<u64> {
    Some(0)
}

/// Sums `/proc/net/dev`: bytes from the receive/transmit byte columns, drops from
/// both drop columns.
pub fn parse_proc_net_dev(text: &str) -> Option<InterfaceStats> {
    let mut stats = InterfaceStats::default();
    let mut seen = false;

    for line in text.lines() {
        let Some((_iface, counters)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<u64> = counters
            .split_whitespace()
            .map(|field| field.parse::<u64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if fields.len() < 12 {
            return None;
        }

        stats.bytes_received = stats.bytes_received.saturating_add(fields[0]);
        stats.packets_dropped = stats.packets_dropped.saturating_add(fields[3]);
        stats.bytes_transmitted = stats.bytes_transmitted.saturating_add(fields[8]);
        stats.packets_dropped = stats.packets_dropped.saturating_add(fields[11]);
        seen = true;
    }

    seen.then_some(stats)
}
