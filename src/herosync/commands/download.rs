//! Fetch camera files into `incoming/`.
//!
//! A file only counts as downloaded once its size matches what the camera
//! reported. The camera copy is deleted after that check passes, never
//! before, and an interrupted transfer leaves no file behind.

use super::{CmdMessage, CmdResult, MediaPaths};
use crate::cancel::CancelToken;
use crate::device::MediaDevice;
use crate::error::{HerosyncError, Result};
use crate::inventory::Inventory;
use crate::model::{FileRecord, Status};
use crate::progress::ProgressReader;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub terms: Vec<String>,
    /// Also re-fetch files already present locally.
    pub force: bool,
    /// Leave the camera copy in place.
    pub keep_original: bool,
}

pub fn run<D: MediaDevice + ?Sized>(
    device: &mut D,
    paths: &MediaPaths,
    options: &DownloadOptions,
    cancel: &CancelToken,
) -> Result<CmdResult> {
    let inventory = Inventory::load(device, &paths.incoming, &paths.outgoing)?
        .filter_by_keyword(&options.terms)?;

    let wanted: &[Status] = if options.force {
        &[Status::OnlyRemote, Status::InSync, Status::OutOfSync]
    } else {
        &[Status::OnlyRemote]
    };
    let pending = inventory.filter_by_status(wanted);

    let mut result = CmdResult::default();
    if pending.is_empty() {
        result.add_message(CmdMessage::info("Nothing to download."));
        return Ok(result);
    }

    fs::create_dir_all(&paths.incoming)?;

    if let Err(e) = device.configure_turbo_transfer(true) {
        warn!(error = %e, "could not enable turbo transfer");
    }
    let outcome = download_all(device, &pending, &paths.incoming, options, cancel, &mut result);
    if let Err(e) = device.configure_turbo_transfer(false) {
        warn!(error = %e, "could not disable turbo transfer");
    }

    outcome.map(|_| result)
}

fn download_all<D: MediaDevice + ?Sized>(
    device: &mut D,
    pending: &Inventory,
    incoming: &Path,
    options: &DownloadOptions,
    cancel: &CancelToken,
    result: &mut CmdResult,
) -> Result<()> {
    for record in pending {
        cancel.check()?;

        match download_file(device, record, incoming, options.keep_original, cancel) {
            Ok(path) => {
                result.add_message(CmdMessage::success(format!("Downloaded {}", record.filename)));
                result.affected_paths.push(path);
            }
            Err(HerosyncError::Cancelled) => return Err(HerosyncError::Cancelled),
            Err(e) => result.add_failure(&record.filename, &e),
        }
    }
    Ok(())
}

/// Downloads one file, stamps its mtime, verifies its size, then
/// optionally deletes the camera copy.
pub fn download_file<D: MediaDevice + ?Sized>(
    device: &mut D,
    record: &FileRecord,
    incoming: &Path,
    keep_original: bool,
    cancel: &CancelToken,
) -> Result<PathBuf> {
    let path = incoming.join(&record.filename);
    info!(filename = %record.filename, size = record.size, "downloading");

    let download = device.open_download(&record.directory, &record.filename)?;
    let total = download.content_length.unwrap_or(record.size);
    let reader = ProgressReader::new(download.reader, "download", record.filename.clone(), total);

    if let Err(e) = stream_to_file(reader, &path, cancel) {
        let _ = fs::remove_file(&path);
        return Err(e);
    }

    let mtime = FileTime::from_unix_time(record.created_at.timestamp(), record.created_at.timestamp_subsec_nanos());
    filetime::set_file_mtime(&path, mtime)?;

    let written = fs::metadata(&path)?.len();
    if written != record.size {
        let _ = fs::remove_file(&path);
        return Err(HerosyncError::Verification(format!(
            "{}: expected {} bytes, got {}",
            record.filename, record.size, written
        )));
    }

    if !keep_original {
        device.delete_file(&record.directory, &record.filename)?;
        info!(filename = %record.filename, "remote file deleted");
    }

    Ok(path)
}

fn stream_to_file<R: Read>(mut reader: R, path: &Path, cancel: &CancelToken) -> Result<()> {
    let mut file = File::create(path)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        cancel.check()?;
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
    }
    file.sync_all()?;
    Ok(())
}
