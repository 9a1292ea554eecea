use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ProbeError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Per-hop lookups, not echoed in verbose mode.
const UNECHOED_PROGRAMS: &[&str] = &["whois"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub exit_ok: bool,
}

pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ProbeError>;
}

/// Runs real processes, killing any child that outlives its timeout.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    verbose: bool,
}

impl SystemCommandRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn echoes(&self, program: &str) -> bool {
        self.verbose && !UNECHOED_PROGRAMS.contains(&program)
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ProbeError> {
        if self.echoes(program) {
            println!("Executing command: {}", command_line(program, args));
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| spawn_error(program, err))?;

        let mut stdout = child.stdout.take().ok_or_else(|| ProbeError::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(ErrorKind::Other, "missing stdout pipe"),
        })?;

        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf);
            buf
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::debug!(program, ?timeout, "killed command after timeout");
                    return Err(ProbeError::CommandTimeout {
                        program: program.to_string(),
                        timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    let _ = child.kill();
                    return Err(ProbeError::Spawn {
                        program: program.to_string(),
                        source: err,
                    });
                }
            }
        };

        let stdout = reader.join().unwrap_or_default();
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            exit_ok: status.success(),
        })
    }
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_error(program: &str, err: std::io::Error) -> ProbeError {
    if err.kind() == ErrorKind::NotFound {
        ProbeError::CommandUnavailable {
            program: program.to_string(),
        }
    } else {
        ProbeError::Spawn {
            program: program.to_string(),
            source: err,
        }
    }
}
