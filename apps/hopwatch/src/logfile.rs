use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Append-only session log: a header, one block per noteworthy cycle, a footer.
#[derive(Debug, Clone)]
pub struct ReportLog {
    path: PathBuf,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_header(&self, host: &str) -> Result<()> {
        self.append(&format!(
            "--- Network Quality Monitoring Log --- \nStarted at: {}\nMonitoring host: {host}\n-------------------------------------\n",
            timestamp()
        ))
    }

    pub fn append_report(&self, report: &str) -> Result<()> {
        self.append(&format!("{report}\n"))
    }

    pub fn write_footer(&self) -> Result<()> {
        self.append(&format!("\nStopped at: {}\n", timestamp()))
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| anyhow!("failed to open log {:?}: {}", self.path, err))?;
        file.write_all(text.as_bytes())
            .map_err(|err| anyhow!("failed to write log {:?}: {}", self.path, err))
    }
}
