//! # CLI Layer
//!
//! The CLI is the only place that:
//! - Knows about terminal I/O and exit codes
//! - Parses arguments
//! - Installs the logging subscriber and the Ctrl-C handler
//! - Builds the real camera client, combiner and publisher
//!
//! ## Flow
//!
//! 1. Parse arguments, then layer defaults, config file, environment and flags
//!    into one validated [`Config`].
//! 2. For camera commands, resolve the base URL (mDNS when no host is set)
//!    and wrap a [`GoProClient`] in the API facade.
//! 3. Dispatch, print the `CmdResult`, and map it to an exit code: non-zero
//!    if any item failed. A filter that matched nothing is not an error.

use super::print::{print_files, print_messages, print_status};
use super::setup::{Cli, Commands};
use clap::Parser;
use herosync::api::{
    self, CleanupOptions, CmdMessage, CmdResult, CombineOptions, DownloadOptions, HerosyncApi, MediaPaths,
};
use herosync::cancel::CancelToken;
use herosync::combiner::FfmpegCombiner;
use herosync::config::Config;
use herosync::device::gopro::GoProClient;
use herosync::discovery::{self, DiscoveryParams};
use herosync::error::Result;
use herosync::logging;
use herosync::publisher::YouTubePublisher;
use std::process::ExitCode;
use tracing::{debug, warn};

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init(&config.log.level);
    debug!(media_dir = %config.media_dir.display(), host = %config.gopro.host, "configuration loaded");

    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel);

    let paths = MediaPaths::from_config(&config);
    let result = match dispatch(&cli.command, &config, paths, &cancel) {
        Ok(result) => result,
        Err(e) if e.is_no_match() => {
            print_messages(&[CmdMessage::info(format!("Nothing to do: {}.", e))]);
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e),
    };

    if let Some(report) = &result.status {
        print_status(report);
    }
    if matches!(cli.command, Commands::List { .. }) {
        print_files(&result.listed_files);
    }
    print_messages(&result.messages);

    if result.has_failures() {
        eprintln!("{} item(s) failed.", result.failures.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config_file.as_deref())?;
    for (key, value) in cli.overrides() {
        config.set(key, &value)?;
    }
    config.validate()?;
    Ok(config)
}

fn install_interrupt_handler(cancel: &CancelToken) {
    let token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupted; finishing up...");
        token.cancel();
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn connect(config: &Config, paths: MediaPaths) -> Result<HerosyncApi<GoProClient>> {
    let base = discovery::resolve_base_url(&config.gopro.host, &config.gopro.scheme, DiscoveryParams::default())?;
    debug!(%base, "using camera");
    Ok(HerosyncApi::new(GoProClient::new(base)?, paths))
}

fn dispatch(command: &Commands, config: &Config, paths: MediaPaths, cancel: &CancelToken) -> Result<CmdResult> {
    match command {
        Commands::Publish { terms } => {
            let publisher = YouTubePublisher::new(&config.youtube.access_token)?;
            api::publish(&paths, terms, &config.video, &publisher, cancel)
        }
        _ => run_on_device(command, config, connect(config, paths)?, cancel),
    }
}

fn run_on_device(
    command: &Commands,
    config: &Config,
    mut api: HerosyncApi<GoProClient>,
    cancel: &CancelToken,
) -> Result<CmdResult> {
    let combine_options = |keep_originals| CombineOptions {
        group_by: config.group.by,
        keep_originals,
    };

    match command {
        Commands::Status => api.status(),
        Commands::List { terms } => api.list(terms),
        Commands::Download {
            terms,
            force,
            keep_original,
        } => {
            let options = DownloadOptions {
                terms: terms.clone(),
                force: *force,
                keep_original: *keep_original,
            };
            api.download(&options, cancel)
        }
        Commands::Combine { keep_originals, .. } => {
            api.combine(&combine_options(*keep_originals), &FfmpegCombiner::default(), cancel)
        }
        Commands::Publish { terms } => {
            let publisher = YouTubePublisher::new(&config.youtube.access_token)?;
            api.publish(terms, &config.video, &publisher, cancel)
        }
        Commands::Cleanup { terms, remote, local } => {
            let options = CleanupOptions {
                terms: terms.clone(),
                remote: *remote,
                local: *local,
            };
            api.cleanup(&options)
        }
        Commands::Yolo => {
            // Fail on a missing token before anything is downloaded.
            let publisher = YouTubePublisher::new(&config.youtube.access_token)?;
            api.yolo(
                &combine_options(false),
                &FfmpegCombiner::default(),
                &config.video,
                &publisher,
                cancel,
            )
        }
    }
}
