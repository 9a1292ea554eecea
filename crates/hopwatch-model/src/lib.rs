//! Shared data structures for hopwatch.

use serde::{Deserialize, Serialize};

/// Hostname and IP placeholder for a hop where every probe timed out.
pub const TIMED_OUT: &str = "Timed Out";

/// Hostname and IP placeholder for the synthetic hop returned when path discovery fails.
pub const TRACE_FAILED: &str = "Traceroute Failed";

/// Ownership placeholder when no registry data is known.
pub const NOT_AVAILABLE: &str = "N/A";

/// Hop index carried by the synthetic failure hop.
pub const FAILED_HOP_INDEX: i32 = -1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub success: bool,
    pub packet_loss_pct: u8,
    pub avg_latency_ms: Option<f64>,
}

impl ProbeResult {
    /// Builds a result from a parsed loss figure, clamping it into `0..=100`.
    pub fn new(packet_loss_pct: u32, avg_latency_ms: Option<f64>) -> Self {
        let packet_loss_pct = packet_loss_pct.min(100) as u8;
        Self {
            success: packet_loss_pct < 100,
            packet_loss_pct,
            avg_latency_ms,
        }
    }

    /// Total loss with no latency; what every ping failure degrades to.
    pub fn failed() -> Self {
        Self::new(100, None)
    }

    pub fn severity(&self) -> Severity {
        Severity::from_loss(self.packet_loss_pct)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Nominal,
    Degraded,
    Outage,
}

impl Severity {
    pub fn from_loss(packet_loss_pct: u8) -> Self {
        match packet_loss_pct {
            0 => Severity::Nominal,
            100..=u8::MAX => Severity::Outage,
            _ => Severity::Degraded,
        }
    }

    pub fn is_alert(self) -> bool {
        !matches!(self, Severity::Nominal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipInfo {
    pub org_name: String,
    pub country: String,
}

impl Default for OwnershipInfo {
    fn default() -> Self {
        Self {
            org_name: NOT_AVAILABLE.to_string(),
            country: NOT_AVAILABLE.to_string(),
        }
    }
}

impl OwnershipInfo {
    pub fn is_known(&self) -> bool {
        self.org_name != NOT_AVAILABLE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HopRecord {
    pub hop_index: i32,
    pub hostname: String,
    pub ip: String,
    pub latency_ms: Option<f64>,
    pub ownership: OwnershipInfo,
}

impl HopRecord {
    pub fn timed_out(hop_index: i32) -> Self {
        Self {
            hop_index,
            hostname: TIMED_OUT.to_string(),
            ip: TIMED_OUT.to_string(),
            latency_ms: None,
            ownership: OwnershipInfo::default(),
        }
    }

    pub fn trace_failed() -> Self {
        Self {
            hop_index: FAILED_HOP_INDEX,
            hostname: TRACE_FAILED.to_string(),
            ip: TRACE_FAILED.to_string(),
            latency_ms: None,
            ownership: OwnershipInfo::default(),
        }
    }

    pub fn is_trace_failure(&self) -> bool {
        self.hop_index == FAILED_HOP_INDEX && self.ip == TRACE_FAILED
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceStats {
    pub bytes_received: u64,
    pub bytes_transmitted: u64,
    pub packets_dropped: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AppLatencySample {
    Measured(f64),
    Failed,
}

impl AppLatencySample {
    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            AppLatencySample::Measured(ms) => Some(*ms),
            AppLatencySample::Failed => None,
        }
    }
}

/// Everything one sampling cycle observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSnapshot {
    pub timestamp: String,
    pub ping: ProbeResult,
    pub hops: Vec<HopRecord>,
    pub interface: InterfaceStats,
    pub app_latency: AppLatencySample,
}

impl CycleSnapshot {
    pub fn severity(&self) -> Severity {
        self.ping.severity()
    }

    pub fn has_unknown_hop_latency(&self) -> bool {
        self.hops.iter().any(|hop| hop.latency_ms.is_none())
    }

    /// Nominal cycles with complete hop data stay out of the log file.
    pub fn should_log(&self) -> bool {
        self.ping.packet_loss_pct > 0 || self.has_unknown_hop_latency()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(loss: u32, hops: Vec<HopRecord>) -> CycleSnapshot {
        CycleSnapshot {
            timestamp: "2026-02-01 12:34:56".to_string(),
            ping: ProbeResult::new(loss, Some(12.3)),
            hops,
            interface: InterfaceStats::default(),
            app_latency: AppLatencySample::Measured(42.0),
        }
    }

    fn hop(index: i32, latency: Option<f64>) -> HopRecord {
        HopRecord {
            hop_index: index,
            hostname: "router.local".to_string(),
            ip: "192.168.1.1".to_string(),
            latency_ms: latency,
            ownership: OwnershipInfo::default(),
        }
    }

    #[test]
    fn loss_is_clamped_and_drives_success() {
        let over = ProbeResult::new(250, None);
        assert_eq!(over.packet_loss_pct, 100);
        assert!(!over.success);

        let partial = ProbeResult::new(25, Some(3.0));
        assert!(partial.success);
        assert_eq!(partial.severity(), Severity::Degraded);

        assert_eq!(ProbeResult::failed(), ProbeResult::new(100, None));
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(Severity::from_loss(0), Severity::Nominal);
        assert_eq!(Severity::from_loss(1), Severity::Degraded);
        assert_eq!(Severity::from_loss(99), Severity::Degraded);
        assert_eq!(Severity::from_loss(100), Severity::Outage);
        assert!(!Severity::Nominal.is_alert());
        assert!(Severity::Degraded.is_alert());
        assert!(Severity::Outage.is_alert());
    }

    #[test]
    fn logging_policy_follows_loss_and_unknown_hops() {
        assert!(!snapshot(0, vec![hop(1, Some(1.0))]).should_log());
        assert!(snapshot(25, vec![hop(1, Some(1.0))]).should_log());
        assert!(snapshot(0, vec![hop(1, Some(1.0)), HopRecord::timed_out(2)]).should_log());
        assert!(snapshot(0, vec![HopRecord::trace_failed()]).should_log());
    }

    #[test]
    fn placeholder_hops() {
        let failed = HopRecord::trace_failed();
        assert!(failed.is_trace_failure());
        assert_eq!(failed.hop_index, -1);
        assert_eq!(failed.hostname, TRACE_FAILED);

        let timed_out = HopRecord::timed_out(4);
        assert!(!timed_out.is_trace_failure());
        assert_eq!(timed_out.ip, TIMED_OUT);
        assert!(!timed_out.ownership.is_known());
    }

    #[test]
    fn snapshot_json_round_trip_is_stable() {
        let snap = snapshot(0, vec![hop(1, Some(1.2)), HopRecord::timed_out(2)]);
        let json = serde_json::to_string_pretty(&snap).unwrap();
        let decoded: CycleSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, decoded);
    }
}
