use std::sync::{Arc, PoisonError, RwLock};

use hopwatch_model::CycleSnapshot;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::MetricsError;

/// The gauges hopwatch exposes. Values always describe the most recent cycle.
pub struct NetworkMetrics {
    registry: Registry,
    ping_latency_ms: Gauge,
    packet_loss_percent: Gauge,
    traceroute_hops: Gauge,
    hop_latency_ms: GaugeVec,
    bytes_received_total: Gauge,
    bytes_transmitted_total: Gauge,
    packets_dropped_total: Gauge,
    application_response_time_ms: Gauge,
}

impl NetworkMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let ping_latency_ms = Gauge::new(
            "network_ping_latency_ms",
            "Ping latency in milliseconds to the internet host.",
        )?;
        let packet_loss_percent = Gauge::new(
            "network_packet_loss_percent",
            "Packet loss percentage to the internet host.",
        )?;
        let traceroute_hops = Gauge::new(
            "network_traceroute_hops",
            "Number of hops reported in the traceroute path.",
        )?;
        let hop_latency_ms = GaugeVec::new(
            Opts::new(
                "network_traceroute_hop_latency_ms",
                "Latency for each hop in the traceroute path.",
            ),
            &["hop", "ip", "hostname"],
        )?;
        let bytes_received_total = Gauge::new(
            "network_bytes_received_total",
            "Total bytes received on the network interfaces.",
        )?;
        let bytes_transmitted_total = Gauge::new(
            "network_bytes_transmitted_total",
            "Total bytes transmitted on the network interfaces.",
        )?;
        let packets_dropped_total = Gauge::new(
            "network_packets_dropped_total",
            "Total packets dropped on the network interfaces.",
        )?;
        let application_response_time_ms = Gauge::new(
            "network_application_response_time_ms",
            "Application response time in milliseconds.",
        )?;

        registry.register(Box::new(ping_latency_ms.clone()))?;
        registry.register(Box::new(packet_loss_percent.clone()))?;
        registry.register(Box::new(traceroute_hops.clone()))?;
        registry.register(Box::new(hop_latency_ms.clone()))?;
        registry.register(Box::new(bytes_received_total.clone()))?;
        registry.register(Box::new(bytes_transmitted_total.clone()))?;
        registry.register(Box::new(packets_dropped_total.clone()))?;
        registry.register(Box::new(application_response_time_ms.clone()))?;

        Ok(Self {
            registry,
            ping_latency_ms,
            packet_loss_percent,
            traceroute_hops,
            hop_latency_ms,
            bytes_received_total,
            bytes_transmitted_total,
            packets_dropped_total,
            application_response_time_ms,
        })
    }

    /// Applies one cycle. Per-hop series are rebuilt from scratch so hops that
    /// vanished from the path do not linger; the application gauge keeps its
    /// previous value when the probe failed.
    pub fn update(&self, snapshot: &CycleSnapshot) {
        self.ping_latency_ms
            .set(snapshot.ping.avg_latency_ms.unwrap_or(f64::NAN));
        self.packet_loss_percent
            .set(f64::from(snapshot.ping.packet_loss_pct));
        self.traceroute_hops.set(snapshot.hops.len() as f64);

        self.hop_latency_ms.reset();
        for hop in &snapshot.hops {
            if let Some(latency) = hop.latency_ms {
                let index = hop.hop_index.to_string();
                self.hop_latency_ms
                    .with_label_values(&[index.as_str(), hop.ip.as_str(), hop.hostname.as_str()])
                    .set(latency);
            }
        }

        self.bytes_received_total
            .set(snapshot.interface.bytes_received as f64);
        self.bytes_transmitted_total
            .set(snapshot.interface.bytes_transmitted as f64);
        self.packets_dropped_total
            .set(snapshot.interface.packets_dropped as f64);

        if let Some(latency) = snapshot.app_latency.latency_ms() {
            self.application_response_time_ms.set(latency);
        }
    }

    /// Prometheus text exposition of the current gauge values.
    pub fn render(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

/// Rendered metrics text shared with the HTTP listener. Writers swap in a whole
/// new document, so readers see either the previous cycle or the current one.
#[derive(Clone, Default)]
pub struct Exposition {
    current: Arc<RwLock<Arc<String>>>,
}

impl Exposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Arc<String> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn store(&self, text: String) {
        let text = Arc::new(text);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = text;
    }
}

/// Owned by the monitor loop: updates gauges, then publishes the rendered text.
pub struct MetricsPublisher {
    metrics: NetworkMetrics,
    exposition: Exposition,
}

impl MetricsPublisher {
    pub fn new() -> Result<Self, MetricsError> {
        let publisher = Self {
            metrics: NetworkMetrics::new()?,
            exposition: Exposition::new(),
        };
        publisher.exposition.store(publisher.metrics.render()?);
        Ok(publisher)
    }

    pub fn exposition(&self) -> Exposition {
        self.exposition.clone()
    }

    pub fn publish(&self, snapshot: &CycleSnapshot) -> Result<(), MetricsError> {
        self.metrics.update(snapshot);
        let text = self.metrics.render()?;
        self.exposition.store(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopwatch_model::{
        AppLatencySample, HopRecord, InterfaceStats, OwnershipInfo, ProbeResult,
    };

    fn hop(index: i32, ip: &str, latency: f64) -> HopRecord {
        HopRecord {
            hop_index: index,
            hostname: format!("hop{index}.example"),
            ip: ip.to_string(),
            latency_ms: Some(latency),
            ownership: OwnershipInfo::default(),
        }
    }

    #[test]
    fn fresh_publisher_has_rendered_text() {
        let publisher = MetricsPublisher::new().unwrap();
        let text = publisher.exposition().load();
        assert!(text.contains("network_packet_loss_percent 0"));
    }

    #[test]
    fn unknown_ping_latency_is_nan() {
        let publisher = MetricsPublisher::new().unwrap();
        publisher
            .publish(&CycleSnapshot {
                timestamp: "2026-02-01 00:00:00".to_string(),
                ping: ProbeResult::failed(),
                hops: vec![HopRecord::trace_failed()],
                interface: InterfaceStats::default(),
                app_latency: AppLatencySample::Failed,
            })
            .unwrap();
        let text = publisher.exposition().load();
        assert!(text.contains("network_ping_latency_ms NaN"));
        assert!(text.contains("network_packet_loss_percent 100"));
        assert!(text.contains("network_traceroute_hops 1"));
        assert!(!text.contains("network_traceroute_hop_latency_ms{"));
    }

    #[test]
    fn hop_labels_carry_index_ip_and_hostname() {
        let publisher = MetricsPublisher::new().unwrap();
        publisher
            .publish(&CycleSnapshot {
                timestamp: "2026-02-01 00:00:00".to_string(),
                ping: ProbeResult::new(0, Some(10.0)),
                hops: vec![hop(1, "192.168.1.1", 1.5)],
                interface: InterfaceStats::default(),
                app_latency: AppLatencySample::Measured(20.0),
            })
            .unwrap();
        let text = publisher.exposition().load();
        assert!(text.contains(
            r#"network_traceroute_hop_latency_ms{hop="1",hostname="hop1.example",ip="192.168.1.1"} 1.5"#
        ));
    }
}
