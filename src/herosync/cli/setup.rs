use clap::{Parser, Subcommand};
use herosync::config::GroupBy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "herosync", bin_name = "herosync", version = env!("HEROSYNC_VERSION"))]
#[command(about = "Download, combine, and publish GoPro videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML config file
    #[arg(long, global = true, env = "HEROSYNC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Camera host or IP; discovered over mDNS when unset
    #[arg(long, global = true, value_name = "HOST")]
    pub gopro_host: Option<String>,

    /// Scheme used to reach the camera (http or https)
    #[arg(long, global = true, value_name = "SCHEME")]
    pub gopro_scheme: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Parent directory of incoming/ and outgoing/
    #[arg(long, global = true, value_name = "DIR")]
    pub media_dir: Option<PathBuf>,
}

impl Cli {
    /// Flag values as dotted config keys, for overlaying onto the loaded config.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(host) = &self.gopro_host {
            overrides.push(("gopro.host", host.clone()));
        }
        if let Some(scheme) = &self.gopro_scheme {
            overrides.push(("gopro.scheme", scheme.clone()));
        }
        if let Some(level) = &self.log_level {
            overrides.push(("log.level", level.clone()));
        }
        if let Some(dir) = &self.media_dir {
            overrides.push(("media_dir", dir.display().to_string()));
        }
        if let Commands::Combine {
            group_by: Some(group_by),
            ..
        } = &self.command
        {
            overrides.push(("group.by", group_by.to_string()));
        }
        overrides
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show camera details and a summary of the inventory
    Status,

    /// List files on the camera and in the local directories
    #[command(alias = "ls")]
    List {
        /// Only show files whose listing line contains one of these terms
        terms: Vec<String>,
    },

    /// Download new files from the camera
    Download {
        /// Only download files matching one of these terms
        terms: Vec<String>,

        /// Download again even if a local copy exists
        #[arg(long)]
        force: bool,

        /// Keep files on the camera after downloading
        #[arg(long)]
        keep_original: bool,
    },

    /// Join chapter files into whole videos
    #[command(alias = "merge")]
    Combine {
        /// Group chapters by recording or by day
        #[arg(long, value_name = "GROUPING")]
        group_by: Option<GroupBy>,

        /// Keep chapter files after combining
        #[arg(long)]
        keep_originals: bool,
    },

    /// Upload combined videos
    #[command(visible_alias = "upload", alias = "pub")]
    Publish {
        /// Only upload videos matching one of these terms
        terms: Vec<String>,
    },

    /// Delete copies that are no longer needed
    #[command(alias = "clean")]
    Cleanup {
        /// Only consider files matching one of these terms
        terms: Vec<String>,

        /// Delete files from the camera regardless of sync state
        #[arg(long)]
        remote: bool,

        /// Delete files from the incoming directory
        #[arg(long)]
        local: bool,
    },

    /// Download, combine and publish in one go
    Yolo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["herosync", "list", "GH01", "--gopro-host", "10.5.5.9"]).unwrap();
        assert!(matches!(&cli.command, Commands::List { terms } if terms == &["GH01"]));
        assert_eq!(cli.overrides(), vec![("gopro.host", "10.5.5.9".to_string())]);
    }

    #[test]
    fn aliases_resolve() {
        let cli = Cli::try_parse_from(["herosync", "merge", "--group-by", "date"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Combine {
                group_by: Some(GroupBy::Date),
                keep_originals: false
            }
        ));
        assert_eq!(cli.overrides(), vec![("group.by", "date".to_string())]);

        let cli = Cli::try_parse_from(["herosync", "clean", "--local"]).unwrap();
        assert!(matches!(cli.command, Commands::Cleanup { local: true, remote: false, .. }));

        let cli = Cli::try_parse_from(["herosync", "upload", "gopro-0007"]).unwrap();
        assert!(matches!(&cli.command, Commands::Publish { terms } if terms == &["gopro-0007"]));
    }

    #[test]
    fn rejects_unknown_grouping() {
        assert!(Cli::try_parse_from(["herosync", "combine", "--group-by", "week"]).is_err());
    }
}
