use crate::alert::AlertDispatcher;
use crate::logfile::{timestamp, ReportLog};
use crate::report::{colorize, render_report, ReportOpts};
use hopwatch_metrics::MetricsPublisher;
use hopwatch_model::CycleSnapshot;
use hopwatch_probe::{AppLatencyProbe, InterfaceStatsReader, PathTracer, PingProber};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Set from the interrupt handler; wakes a sleeping loop immediately.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps up to `timeout`; returns true if a stop was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            stopped = cvar
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *stopped
    }
}

/// All probes for one host, run strictly in sequence.
pub struct Probes {
    pub host: String,
    pub ping: PingProber,
    pub tracer: PathTracer,
    pub interfaces: InterfaceStatsReader,
    pub app: AppLatencyProbe,
}

impl Probes {
    pub fn sample(&self) -> CycleSnapshot {
        let timestamp = timestamp();
        let ping = self.ping.probe(&self.host);
        let hops = self.tracer.trace(&self.host);
        let interface = self.interfaces.read();
        let app_latency = self.app.sample();
        CycleSnapshot {
            timestamp,
            ping,
            hops,
            interface,
            app_latency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Sampling,
    Publishing,
    Sleeping,
    Stopped,
}

pub struct Monitor {
    probes: Probes,
    publisher: MetricsPublisher,
    alerts: AlertDispatcher,
    log: ReportLog,
    opts: ReportOpts,
    interval: Duration,
    state: LoopState,
}

impl Monitor {
    pub fn new(
        probes: Probes,
        publisher: MetricsPublisher,
        alerts: AlertDispatcher,
        log: ReportLog,
        opts: ReportOpts,
        interval: Duration,
    ) -> Self {
        Self {
            probes,
            publisher,
            alerts,
            log,
            opts,
            interval,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Cycles until `stop` fires. Stop is only observed between cycles.
    pub fn run(&mut self, stop: &StopSignal) {
        while !stop.is_triggered() {
            self.run_cycle();
            self.transition(LoopState::Sleeping);
            if stop.wait(self.interval) {
                break;
            }
        }
        self.transition(LoopState::Stopped);
    }

    /// One sample, publish, alert, render and log pass. No probe failure aborts it.
    pub fn run_cycle(&mut self) -> CycleSnapshot {
        self.transition(LoopState::Sampling);
        let snapshot = self.probes.sample();

        self.transition(LoopState::Publishing);
        if let Err(err) = self.publisher.publish(&snapshot) {
            tracing::error!(error = %err, "failed to publish metrics");
        }

        let severity = snapshot.severity();
        self.alerts.alert(severity);

        let report = render_report(&snapshot, &self.probes.host, self.probes.app.url());
        println!("{}", colorize(&report, severity, &self.opts));

        if snapshot.should_log() {
            if let Err(err) = self.log.append_report(&report) {
                tracing::warn!(error = %err, "failed to append report");
            }
        }

        tracing::debug!(
            ?severity,
            loss = snapshot.ping.packet_loss_pct,
            hops = snapshot.hops.len(),
            "cycle complete"
        );
        snapshot
    }

    fn transition(&mut self, next: LoopState) {
        tracing::trace!(from = ?self.state, to = ?next, "monitor state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::tests::recording_dispatcher;
    use hopwatch_model::{ProbeResult, Severity};
    use hopwatch_probe::{CommandOutput, CommandRunner, HopEnricher, Platform, ProbeError};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::mpsc::Receiver;
    use std::thread;

    struct ScriptedRunner {
        outputs: HashMap<&'static str, &'static str>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(
            &self,
            program: &str,
            _args: &[String],
            timeout: Duration,
        ) -> Result<CommandOutput, ProbeError> {
            match self.outputs.get(program) {
                Some(stdout) => Ok(CommandOutput {
                    stdout: stdout.to_string(),
                    exit_ok: true,
                }),
                None => Err(ProbeError::CommandTimeout {
                    program: program.to_string(),
                    timeout,
                }),
            }
        }
    }

    const HEALTHY_TRACE: &str =
        " 1  gw (192.168.1.1)  1.0 ms\n 2  core (10.0.0.1)  5.0 ms\n 3  edge (10.0.0.2)  9.0 ms\n";

    const PING_OK: &str = "4 packets transmitted, 4 received, 0% packet loss\n\
                           rtt min/avg/max/mdev = 11.0/12.3/13.0/0.5 ms\n";

    fn monitor(
        outputs: HashMap<&'static str, &'static str>,
        log: PathBuf,
    ) -> (Monitor, Receiver<PathBuf>) {
        let runner: Arc<dyn CommandRunner> = Arc::new(ScriptedRunner { outputs });
        let probes = Probes {
            host: "8.8.8.8".to_string(),
            ping: PingProber::new(runner.clone(), Platform::Linux),
            tracer: PathTracer::new(
                runner.clone(),
                Platform::Linux,
                HopEnricher::new(runner),
                None,
            ),
            interfaces: InterfaceStatsReader::new(),
            app: AppLatencyProbe::new("http://127.0.0.1:1/").unwrap(),
        };
        let (alerts, played) = recording_dispatcher(true);
        let monitor = Monitor::new(
            probes,
            MetricsPublisher::new().unwrap(),
            alerts,
            ReportLog::new(log),
            ReportOpts { plain: true },
            Duration::from_millis(10),
        );
        (monitor, played)
    }

    #[test]
    fn nominal_cycle_is_not_logged_or_alerted() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log.txt");
        let (mut monitor, played) = monitor(
            HashMap::from([("ping", PING_OK), ("traceroute", HEALTHY_TRACE)]),
            log.clone(),
        );

        let snapshot = monitor.run_cycle();
        assert_eq!(snapshot.ping, ProbeResult::new(0, Some(12.3)));
        assert_eq!(snapshot.severity(), Severity::Nominal);
        assert_eq!(snapshot.hops.len(), 3);
        assert!(!log.exists());
        assert_eq!(monitor.state(), LoopState::Publishing);
        assert!(played.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn ping_timeout_is_an_outage_alerted_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log.txt");
        let (mut monitor, played) =
            monitor(HashMap::from([("traceroute", HEALTHY_TRACE)]), log.clone());

        let snapshot = monitor.run_cycle();
        assert_eq!(snapshot.ping, ProbeResult::failed());
        assert_eq!(snapshot.severity(), Severity::Outage);

        let contents = std::fs::read_to_string(&log).unwrap();
        assert!(contents.contains("The internet connection is DOWN"));
        assert!(contents.contains("Hop 3: edge (10.0.0.2) (9ms)"));

        let sound = played.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(sound, PathBuf::from("red.wav"));
    }

    #[test]
    fn stop_ends_the_loop_between_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let (mut monitor, _played) = monitor(HashMap::new(), dir.path().join("log.txt"));
        let stop = StopSignal::new();

        let trigger = stop.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            trigger.trigger();
        });

        monitor.run(&stop);
        stopper.join().unwrap();
        assert_eq!(monitor.state(), LoopState::Stopped);
    }

    #[test]
    fn stop_signal_wakes_a_long_wait() {
        let stop = StopSignal::new();
        assert!(!stop.wait(Duration::from_millis(10)));

        let trigger = stop.clone();
        let started = Instant::now();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            trigger.trigger();
        });
        assert!(stop.wait(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(stop.is_triggered());
    }
}
