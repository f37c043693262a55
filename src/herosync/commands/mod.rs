use crate::config::Config;
use crate::error::HerosyncError;
use crate::model::FileRecord;
use std::path::PathBuf;
use tracing::error;

pub mod cleanup;
pub mod combine;
pub mod download;
pub mod list;
pub mod publish;
pub mod status;

/// The two local staging directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPaths {
    pub incoming: PathBuf,
    pub outgoing: PathBuf,
}

impl MediaPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            incoming: config.incoming_dir(),
            outgoing: config.outgoing_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    fn with_level(level: MessageLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::with_level(MessageLevel::Info, content)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::with_level(MessageLevel::Success, content)
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self::with_level(MessageLevel::Warning, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::with_level(MessageLevel::Error, content)
    }
}

/// Outcome of a command: what it looked at, what it changed, and what failed.
#[derive(Debug, Default)]
pub struct CmdResult {
    pub listed_files: Vec<FileRecord>,
    /// Local paths written or removed.
    pub affected_paths: Vec<PathBuf>,
    /// `(filename, remote id)` of each upload.
    pub uploaded: Vec<(String, String)>,
    pub status: Option<status::StatusReport>,
    pub messages: Vec<CmdMessage>,
    /// One entry per item that failed; the batch carried on past each.
    pub failures: Vec<String>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    /// Records a per-item failure and keeps going.
    pub fn add_failure(&mut self, item: &str, err: &HerosyncError) {
        error!(item, kind = err.kind(), error = %err, "item failed");
        let line = format!("{}: {}", item, err);
        self.messages.push(CmdMessage::error(line.clone()));
        self.failures.push(line);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn with_listed_files(mut self, files: Vec<FileRecord>) -> Self {
        self.listed_files = files;
        self
    }

    pub fn with_status(mut self, report: status::StatusReport) -> Self {
        self.status = Some(report);
        self
    }

    /// Appends another result, as when several commands run in sequence.
    pub fn merge(&mut self, other: CmdResult) {
        self.listed_files.extend(other.listed_files);
        self.affected_paths.extend(other.affected_paths);
        self.uploaded.extend(other.uploaded);
        if other.status.is_some() {
            self.status = other.status;
        }
        self.messages.extend(other.messages);
        self.failures.extend(other.failures);
    }
}
