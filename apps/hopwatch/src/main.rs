mod alert;
mod config;
mod logfile;
mod monitor;
mod report;

use alert::{AlertDispatcher, SoundConfig, SystemSoundPlayer};
use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use hopwatch_metrics::{MetricsPublisher, MetricsServer};
use hopwatch_probe::{
    AppLatencyProbe, CommandRunner, HopEnricher, InterfaceStatsReader, PathTracer, PingProber,
    Platform, SystemCommandRunner,
};
use logfile::ReportLog;
use monitor::{Monitor, Probes, StopSignal};
use report::ReportOpts;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hopwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::parse();
    let platform = Platform::detect();
    tracing::debug!(?platform, host = %config.host, "starting");

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.trigger())
        .context("failed to install interrupt handler")?;

    let publisher = MetricsPublisher::new().context("failed to build metrics registry")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let _server = MetricsServer::start(addr, publisher.exposition())
        .with_context(|| format!("failed to expose metrics on {addr}"))?;

    println!(
        "Starting network quality monitoring for {} every {} seconds.",
        config.host, config.interval_secs
    );
    println!("Prometheus metrics exposed on port {}.", config.metrics_port);
    println!("Press Ctrl+C to stop.");

    let alerts = AlertDispatcher::spawn(
        Box::new(SystemSoundPlayer::new(platform)),
        SoundConfig {
            enabled: config.sound,
            yellow: config.yellow_sound.clone(),
            red: config.red_sound.clone(),
        },
    );
    if config.sound {
        println!("Testing sound alerts...");
        alerts.sound_check();
    }

    let log = ReportLog::new(config.log_path.clone());
    log.write_header(&config.host)?;
    tracing::info!(path = %log.path().display(), "logging degraded cycles");

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new(config.verbose));
    let probes = Probes {
        host: config.host.clone(),
        ping: PingProber::new(runner.clone(), platform),
        tracer: PathTracer::new(
            runner.clone(),
            platform,
            HopEnricher::new(runner),
            Some(config.trace_log_path.clone()),
        ),
        interfaces: InterfaceStatsReader::new(),
        app: AppLatencyProbe::new(config.app_url.clone())
            .context("failed to build application probe")?,
    };

    let mut monitor = Monitor::new(
        probes,
        publisher,
        alerts,
        log.clone(),
        ReportOpts {
            plain: config.plain,
        },
        config.interval(),
    );
    monitor.run(&stop);
    tracing::debug!(state = ?monitor.state(), "monitor loop exited");

    println!("\nMonitoring stopped by user.");
    log.write_footer()?;
    Ok(())
}
