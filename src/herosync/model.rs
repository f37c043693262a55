use crate::filename::{parse_filename, FilenameInfo};
use chrono::{DateTime, Utc};
use indicatif::DecimalBytes;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Where a file currently lives, relative to the camera and the local media dirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Status {
    /// Only on the camera.
    OnlyRemote,
    /// Only in the local incoming dir.
    OnlyLocalIncoming,
    /// On both, with matching sizes.
    InSync,
    /// On both, but the sizes differ.
    OutOfSync,
    /// Combined output in the outgoing dir, ready for publishing.
    Processed,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::OnlyRemote,
        Status::OnlyLocalIncoming,
        Status::InSync,
        Status::OutOfSync,
        Status::Processed,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            Status::OnlyRemote => "only stored on gopro",
            Status::OnlyLocalIncoming => "only stored on local",
            Status::InSync => "saved on all devices",
            Status::OutOfSync => "SIZES ARE MISMATCHED",
            Status::Processed => "ready for publishing",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Status::OnlyRemote => "«",
            Status::OnlyLocalIncoming => "»",
            Status::InSync => "=",
            Status::OutOfSync => "!",
            Status::Processed => "^",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One media file as seen during a single reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Remote folder name (e.g. `100GOPRO`) or an absolute local directory.
    pub directory: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
    pub status: Status,
    #[serde(skip)]
    display: String,
}

impl FileRecord {
    pub fn new(
        directory: impl Into<String>,
        filename: impl Into<String>,
        created_at: DateTime<Utc>,
        size: u64,
        status: Status,
    ) -> Self {
        let mut record = Self {
            directory: directory.into(),
            filename: filename.into(),
            created_at,
            size,
            status,
            display: String::new(),
        };
        record.display = record.render_display();
        record
    }

    /// Camera filename fields, if the name follows the camera convention.
    pub fn info(&self) -> Option<FilenameInfo> {
        parse_filename(&self.filename)
    }

    /// Precomputed one-line summary, also used as the keyword search haystack.
    pub fn display_line(&self) -> &str {
        &self.display
    }

    fn render_display(&self) -> String {
        let location = match self.status {
            Status::OnlyRemote => "pending".to_string(),
            Status::InSync => "incoming".to_string(),
            _ => Path::new(&self.directory)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.directory.clone()),
        };

        format!(
            "{}  {} {:>8}  {:>20}  {} / {}",
            self.status.symbol(),
            self.status.description(),
            human_bytes(self.size),
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            location,
            self.filename,
        )
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Formats a byte count with SI units, e.g. `1.20 GB`.
pub fn human_bytes(bytes: u64) -> String {
    DecimalBytes(bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn human_bytes_uses_si_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(999), "999 B");
        assert_eq!(human_bytes(1000), "1.00 kB");
        assert_eq!(human_bytes(82_854_982), "82.85 MB");
        assert_eq!(human_bytes(4_000_000_000), "4.00 GB");
    }

    #[test]
    fn display_line_shows_pending_for_remote_files() {
        let created = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        let record = FileRecord::new("100GOPRO", "GH010007.MP4", created, 1000, Status::OnlyRemote);
        let line = record.display_line();
        assert!(line.starts_with("«  only stored on gopro"));
        assert!(line.contains("2025-01-15 09:30:00"));
        assert!(line.ends_with("pending / GH010007.MP4"));
    }

    #[test]
    fn display_line_uses_directory_basename_for_local_files() {
        let created = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        let record = FileRecord::new(
            "/media/herosync/outgoing",
            "gopro-0007.mp4",
            created,
            2_500_000,
            Status::Processed,
        );
        assert!(record.display_line().ends_with("outgoing / gopro-0007.mp4"));
        assert!(record.display_line().contains("2.50 MB"));
    }
}
