use anyhow::{anyhow, Context, Result};
use hopwatch_model::Severity;
use hopwatch_probe::Platform;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

const SOUND_CHECK_GAP: Duration = Duration::from_secs(1);

pub trait SoundPlayer: Send {
    fn play(&self, path: &Path) -> Result<()>;
}

/// Plays a sound file with whatever the host OS ships for it.
pub struct SystemSoundPlayer {
    platform: Platform,
}

impl SystemSoundPlayer {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn spawn_and_wait(program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to launch {program}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("{program} exited with status: {status}"))
        }
    }
}

impl SoundPlayer for SystemSoundPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        let file = path.to_string_lossy().into_owned();
        match self.platform {
            Platform::MacOs => Self::spawn_and_wait("afplay", &[file.as_str()]),
            Platform::Linux => Self::spawn_and_wait("paplay", &[file.as_str()])
                .or_else(|_| Self::spawn_and_wait("aplay", &["-q", file.as_str()])),
            Platform::Windows => {
                let script = format!(
                    "(New-Object Media.SoundPlayer '{}').PlaySync();",
                    file.replace('\'', "''")
                );
                Self::spawn_and_wait("powershell", &["-NoProfile", "-Command", script.as_str()])
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SoundConfig {
    pub enabled: bool,
    pub yellow: PathBuf,
    pub red: PathBuf,
}

enum AlertMessage {
    Alert(Severity),
    SoundCheck,
}

/// Front of the alert queue. Sending never blocks and never reports playback
/// errors back to the caller.
pub struct AlertDispatcher {
    sender: Option<Sender<AlertMessage>>,
}

impl AlertDispatcher {
    pub fn spawn(player: Box<dyn SoundPlayer>, sounds: SoundConfig) -> Self {
        if !sounds.enabled {
            return Self::disabled();
        }

        let (tx, rx) = mpsc::channel::<AlertMessage>();
        let spawned = thread::Builder::new()
            .name("alert-sounds".to_string())
            .spawn(move || {
                for message in rx {
                    match message {
                        AlertMessage::Alert(severity) => {
                            if let Some(path) = sound_for(&sounds, severity) {
                                play_logged(player.as_ref(), path);
                            }
                        }
                        AlertMessage::SoundCheck => {
                            play_logged(player.as_ref(), &sounds.yellow);
                            thread::sleep(SOUND_CHECK_GAP);
                            play_logged(player.as_ref(), &sounds.red);
                            println!("Sound test complete.");
                        }
                    }
                }
            });

        match spawned {
            Ok(_) => Self { sender: Some(tx) },
            Err(err) => {
                tracing::warn!(error = %err, "alert worker unavailable; sounds disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn alert(&self, severity: Severity) {
        if severity.is_alert() {
            self.send(AlertMessage::Alert(severity));
        }
    }

    pub fn sound_check(&self) {
        self.send(AlertMessage::SoundCheck);
    }

    fn send(&self, message: AlertMessage) {
        if let Some(sender) = &self.sender {
            if sender.send(message).is_err() {
                tracing::warn!("alert worker has stopped");
            }
        }
    }
}

fn sound_for(sounds: &SoundConfig, severity: Severity) -> Option<&Path> {
    match severity {
        Severity::Nominal => None,
        Severity::Degraded => Some(sounds.yellow.as_path()),
        Severity::Outage => Some(sounds.red.as_path()),
    }
}

fn play_logged(player: &dyn SoundPlayer, path: &Path) {
    if let Err(err) = player.play(path) {
        tracing::warn!(path = %path.display(), error = %err, "alert sound failed");
    }
}
