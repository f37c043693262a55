use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HerosyncError {
    #[error("no GoPro answered the discovery query; is the camera powered on and on this network?")]
    DiscoveryTimeout,

    #[error("could not resolve {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("could not read directory {}: {source}", dir.display())]
    Scan {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("media listing failed: {0}")]
    Listing(String),

    #[error("no matching files found for {0}")]
    NoMatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("combine failed: {0}")]
    Combine(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl HerosyncError {
    /// Short, stable label for the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            HerosyncError::DiscoveryTimeout => "discovery-timeout",
            HerosyncError::Resolution { .. } => "resolution-failure",
            HerosyncError::Scan { .. } => "scan-failure",
            HerosyncError::Listing(_) | HerosyncError::Http(_) | HerosyncError::Json(_) => {
                "listing-failure"
            }
            HerosyncError::NoMatch(_) => "no-match",
            HerosyncError::Io(_) => "io",
            HerosyncError::Config(_) => "config",
            HerosyncError::Combine(_) => "combine",
            HerosyncError::Publish(_) => "publish",
            HerosyncError::Verification(_) => "verification",
            HerosyncError::Cancelled => "cancelled",
        }
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, HerosyncError::NoMatch(_))
    }
}

pub type Result<T> = std::result::Result<T, HerosyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_and_resolution_are_distinct_kinds() {
        let timeout = HerosyncError::DiscoveryTimeout;
        let resolution = HerosyncError::Resolution {
            host: "gopro.lan".into(),
            reason: "no IPv4 address found".into(),
        };
        assert_ne!(timeout.kind(), resolution.kind());
        assert_eq!(resolution.to_string(), "could not resolve gopro.lan: no IPv4 address found");
    }

    #[test]
    fn no_match_is_flagged() {
        assert!(HerosyncError::NoMatch("Media ID: 7".into()).is_no_match());
        assert!(!HerosyncError::Cancelled.is_no_match());
    }
}
