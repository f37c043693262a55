//! Layered configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! `HEROSYNC_*` environment variables, command line flags. Every layer writes
//! through [`Config::set`] except the file, which deserializes over the
//! defaults.

use crate::error::{HerosyncError, Result};
use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILENAME: &str = "config.toml";
const ENV_PREFIX: &str = "HEROSYNC_";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Environment variable suffix to dotted config key.
const ENV_KEYS: [(&str, &str); 11] = [
    ("GOPRO_HOST", "gopro.host"),
    ("GOPRO_SCHEME", "gopro.scheme"),
    ("LOG_LEVEL", "log.level"),
    ("MEDIA_DIR", "media_dir"),
    ("GROUP_BY", "group.by"),
    ("VIDEO_TITLE", "video.title"),
    ("VIDEO_DESCRIPTION", "video.description"),
    ("VIDEO_TAGS", "video.tags"),
    ("VIDEO_CATEGORY_ID", "video.category_id"),
    ("VIDEO_PRIVACY_STATUS", "video.privacy_status"),
    ("YOUTUBE_ACCESS_TOKEN", "youtube.access_token"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gopro: GoProConfig,
    pub log: LogConfig,
    /// Parent of the `incoming/` and `outgoing/` directories.
    pub media_dir: PathBuf,
    pub group: GroupConfig,
    pub video: VideoConfig,
    pub youtube: YouTubeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoProConfig {
    /// Empty means mDNS discovery.
    pub host: String,
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub by: GroupBy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Title template; see [`crate::publisher::render_title`].
    pub title: String,
    pub description: String,
    /// Comma-separated.
    pub tags: String,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub access_token: String,
}

/// How `combine` groups chapter files into one video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    /// One video per recording.
    #[default]
    MediaId,
    /// One video per calendar day.
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    Public,
    #[default]
    Private,
    Unlisted,
}

impl FromStr for GroupBy {
    type Err = HerosyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "media-id" => Ok(GroupBy::MediaId),
            "date" => Ok(GroupBy::Date),
            other => Err(HerosyncError::Config(format!(
                "invalid group-by: {}; choose media-id or date",
                other
            ))),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupBy::MediaId => "media-id",
            GroupBy::Date => "date",
        })
    }
}

impl FromStr for PrivacyStatus {
    type Err = HerosyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(PrivacyStatus::Public),
            "private" => Ok(PrivacyStatus::Private),
            "unlisted" => Ok(PrivacyStatus::Unlisted),
            other => Err(HerosyncError::Config(format!(
                "invalid privacy status: {}; choose public, private, or unlisted",
                other
            ))),
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrivacyStatus::Public => "public",
            PrivacyStatus::Private => "private",
            PrivacyStatus::Unlisted => "unlisted",
        })
    }
}

impl Default for GoProConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            scheme: "http".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            title: "GoPro ${identifier}".to_string(),
            description: String::new(),
            tags: String::new(),
            category_id: "17".to_string(),
            privacy_status: PrivacyStatus::default(),
        }
    }
}

impl VideoConfig {
    /// Comma-separated tags, trimmed, empties dropped.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gopro: GoProConfig::default(),
            log: LogConfig::default(),
            media_dir: default_media_dir(),
            group: GroupConfig::default(),
            video: VideoConfig::default(),
            youtube: YouTubeConfig::default(),
        }
    }
}

/// `<videos dir>/herosync`, falling back to `~/Videos/herosync`.
pub fn default_media_dir() -> PathBuf {
    if let Some(videos) = UserDirs::new().and_then(|dirs| dirs.video_dir().map(Path::to_path_buf)) {
        return videos.join("herosync");
    }
    match BaseDirs::new() {
        Some(base) => base.home_dir().join("Videos").join("herosync"),
        None => PathBuf::from("herosync"),
    }
}

/// `<config dir>/herosync/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "herosync").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl Config {
    /// Defaults, overlaid with the file at `path` when it exists.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| HerosyncError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Defaults, file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Applies `HEROSYNC_*` variables; anything else is ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if let Some((_, key)) = ENV_KEYS.iter().find(|(env, _)| *env == suffix) {
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Sets one value by its dotted key, e.g. `gopro.host`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "gopro.host" => self.gopro.host = value.to_string(),
            "gopro.scheme" => self.gopro.scheme = value.to_string(),
            "log.level" => self.log.level = value.to_lowercase(),
            "media_dir" => self.media_dir = PathBuf::from(value),
            "group.by" => self.group.by = value.parse()?,
            "video.title" => self.video.title = value.to_string(),
            "video.description" => self.video.description = value.to_string(),
            "video.tags" => self.video.tags = value.to_string(),
            "video.category_id" => self.video.category_id = value.to_string(),
            "video.privacy_status" => self.video.privacy_status = value.parse()?,
            "youtube.access_token" => self.youtube.access_token = value.to_string(),
            other => return Err(HerosyncError::Config(format!("unknown config key: {}", other))),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.gopro.scheme.as_str(), "http" | "https") {
            return Err(HerosyncError::Config(format!(
                "invalid scheme: {}; choose http or https",
                self.gopro.scheme
            )));
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(HerosyncError::Config(format!(
                "invalid log level: {}; choose one of {}",
                self.log.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.media_dir.as_os_str().is_empty() {
            return Err(HerosyncError::Config("media_dir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Where downloaded chapter files are staged.
    pub fn incoming_dir(&self) -> PathBuf {
        self.media_dir.join("incoming")
    }

    /// Where combined videos wait for publishing.
    pub fn outgoing_dir(&self) -> PathBuf {
        self.media_dir.join("outgoing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.gopro.host, "");
        assert_eq!(config.gopro.scheme, "http");
        assert_eq!(config.log.level, "info");
        assert_eq!(config.group.by, GroupBy::MediaId);
        assert_eq!(config.video.privacy_status, PrivacyStatus::Private);
        assert!(config.media_dir.ends_with("herosync"));
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::from_file(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
media_dir = "/srv/gopro"

[gopro]
host = "10.5.5.9:8080"

[group]
by = "date"

[video]
tags = "mtb, trail ,"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.gopro.host, "10.5.5.9:8080");
        assert_eq!(config.gopro.scheme, "http");
        assert_eq!(config.group.by, GroupBy::Date);
        assert_eq!(config.incoming_dir(), PathBuf::from("/srv/gopro/incoming"));
        assert_eq!(config.outgoing_dir(), PathBuf::from("/srv/gopro/outgoing"));
        assert_eq!(config.video.tag_list(), vec!["mtb", "trail"]);
        assert_eq!(config.video.title, "GoPro ${identifier}");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[group]\nby = \"week\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, HerosyncError::Config(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::default();
        config.gopro.host = "from-file".to_string();

        config
            .apply_env(env(&[
                ("HEROSYNC_GOPRO_HOST", "gopro.lan"),
                ("HEROSYNC_LOG_LEVEL", "DEBUG"),
                ("HEROSYNC_MEDIA_DIR", "/data/media"),
                ("HEROSYNC_VIDEO_PRIVACY_STATUS", "unlisted"),
                ("HEROSYNC_CONFIG_FILE", "/ignored.toml"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();

        assert_eq!(config.gopro.host, "gopro.lan");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.media_dir, PathBuf::from("/data/media"));
        assert_eq!(config.video.privacy_status, PrivacyStatus::Unlisted);
    }

    #[test]
    fn invalid_enum_values_are_rejected_early() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("HEROSYNC_GROUP_BY", "week")])).is_err());
        assert!(config.set("video.privacy_status", "secret").is_err());
        assert!(config.set("gopro.port", "80").is_err());
    }

    #[test]
    fn validation_catches_scheme_and_level() {
        let mut config = Config::default();
        config.gopro.scheme = "ftp".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("invalid scheme"));

        let mut config = Config::default();
        config.log.level = "loud".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("invalid log level"));
    }
}
