use hopwatch_metrics::{MetricsPublisher, MetricsServer};
use hopwatch_model::{
    AppLatencySample, CycleSnapshot, HopRecord, InterfaceStats, OwnershipInfo, ProbeResult,
};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

fn hop(index: i32, latency: Option<f64>) -> HopRecord {
    HopRecord {
        hop_index: index,
        hostname: format!("hop{index}.example.net"),
        ip: format!("203.0.113.{index}"),
        latency_ms: latency,
        ownership: OwnershipInfo::default(),
    }
}

fn snapshot(hops: Vec<HopRecord>, app_latency: AppLatencySample) -> CycleSnapshot {
    CycleSnapshot {
        timestamp: "2026-02-01 12:00:00".to_string(),
        ping: ProbeResult::new(0, Some(12.3)),
        hops,
        interface: InterfaceStats {
            bytes_received: 1_000,
            bytes_transmitted: 2_000,
            packets_dropped: 3,
        },
        app_latency,
    }
}

fn hop_series(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| line.starts_with("network_traceroute_hop_latency_ms{"))
        .collect()
}

#[test]
fn publishing_same_snapshot_twice_is_idempotent() {
    let publisher = MetricsPublisher::new().unwrap();
    let snap = snapshot(
        vec![hop(1, Some(1.0)), hop(2, None), hop(3, Some(9.5))],
        AppLatencySample::Measured(80.0),
    );

    publisher.publish(&snap).unwrap();
    let first = publisher.exposition().load();
    publisher.publish(&snap).unwrap();
    let second = publisher.exposition().load();

    assert_eq!(first, second);
    assert_eq!(hop_series(&second).len(), 2);
    assert!(second.contains("network_traceroute_hops 3"));
    assert!(second.contains("network_ping_latency_ms 12.3"));
    assert!(second.contains("network_bytes_received_total 1000"));
    assert!(second.contains("network_bytes_transmitted_total 2000"));
    assert!(second.contains("network_packets_dropped_total 3"));
}

#[test]
fn stale_hop_labels_are_removed() {
    let publisher = MetricsPublisher::new().unwrap();
    publisher
        .publish(&snapshot(
            vec![hop(1, Some(1.0)), hop(2, Some(2.0)), hop(3, Some(3.0))],
            AppLatencySample::Measured(50.0),
        ))
        .unwrap();
    assert_eq!(hop_series(&publisher.exposition().load()).len(), 3);

    publisher
        .publish(&snapshot(
            vec![hop(1, Some(1.0)), hop(2, Some(2.0))],
            AppLatencySample::Measured(50.0),
        ))
        .unwrap();
    let text = publisher.exposition().load();
    let series = hop_series(&text);
    assert_eq!(series.len(), 2);
    assert!(series.iter().all(|line| !line.contains(r#"hop="3""#)));
    assert!(!text.contains("203.0.113.3"));
}

#[test]
fn failed_application_probe_keeps_previous_value() {
    let publisher = MetricsPublisher::new().unwrap();
    publisher
        .publish(&snapshot(vec![hop(1, Some(1.0))], AppLatencySample::Measured(42.5)))
        .unwrap();
    publisher
        .publish(&snapshot(vec![hop(1, Some(1.0))], AppLatencySample::Failed))
        .unwrap();
    assert!(publisher
        .exposition()
        .load()
        .contains("network_application_response_time_ms 42.5"));
}

fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
    )
    .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn endpoint_serves_latest_published_snapshot() {
    let publisher = MetricsPublisher::new().unwrap();
    let server =
        MetricsServer::start("127.0.0.1:0".parse().unwrap(), publisher.exposition()).unwrap();

    publisher
        .publish(&snapshot(vec![hop(1, Some(4.25))], AppLatencySample::Measured(10.0)))
        .unwrap();

    let response = http_get(server.local_addr(), "/metrics");
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("network_traceroute_hop_latency_ms{"));
    assert!(response.contains("4.25"));

    let health = http_get(server.local_addr(), "/healthz");
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(health.ends_with("ok"));
}

#[test]
fn port_in_use_is_a_startup_error() {
    let publisher = MetricsPublisher::new().unwrap();
    let first =
        MetricsServer::start("127.0.0.1:0".parse().unwrap(), publisher.exposition()).unwrap();
    let second = MetricsServer::start(first.local_addr(), publisher.exposition());
    assert!(second.is_err());
}
