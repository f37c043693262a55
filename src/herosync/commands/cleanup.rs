//! Delete copies that are no longer needed.
//!
//! Without flags only the camera copy of an `InSync` file is removed, since a
//! verified local copy exists. `--remote` and `--local` widen that to every
//! camera copy or every incoming copy respectively. Outgoing files are never
//! touched.

use super::{CmdMessage, CmdResult, MediaPaths};
use crate::device::MediaDevice;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::model::{FileRecord, Status};
use std::fs;
use std::io::ErrorKind;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    pub terms: Vec<String>,
    /// Delete camera copies regardless of sync state.
    pub remote: bool,
    /// Delete copies in `incoming/`.
    pub local: bool,
}

impl CleanupOptions {
    fn deletes_remote(&self, record: &FileRecord) -> bool {
        match record.status {
            Status::Processed | Status::OnlyLocalIncoming => false,
            Status::InSync => self.remote || !self.local,
            Status::OnlyRemote | Status::OutOfSync => self.remote,
        }
    }

    fn deletes_local(&self, record: &FileRecord) -> bool {
        match record.status {
            Status::Processed | Status::OnlyRemote => false,
            Status::InSync | Status::OutOfSync | Status::OnlyLocalIncoming => self.local,
        }
    }
}

pub fn run<D: MediaDevice + ?Sized>(device: &mut D, paths: &MediaPaths, options: &CleanupOptions) -> Result<CmdResult> {
    let inventory = Inventory::load(device, &paths.incoming, &paths.outgoing)?
        .filter_by_keyword(&options.terms)?;

    let mut result = CmdResult::default();
    let mut deleted = 0;

    for record in &inventory {
        if options.deletes_remote(record) {
            match device.delete_file(&record.directory, &record.filename) {
                Ok(()) => {
                    info!(filename = %record.filename, "remote file deleted");
                    result.add_message(CmdMessage::success(format!(
                        "Deleted {}/{} from the camera",
                        record.directory, record.filename
                    )));
                    deleted += 1;
                }
                Err(e) => result.add_failure(&record.filename, &e),
            }
        }

        if options.deletes_local(record) {
            let path = paths.incoming.join(&record.filename);
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "local file deleted");
                    result.add_message(CmdMessage::success(format!("Deleted {}", path.display())));
                    result.affected_paths.push(path);
                    deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "local file already gone");
                    result.add_message(CmdMessage::warning(format!("{} was already gone", path.display())));
                }
                Err(e) => result.add_failure(&record.filename, &e.into()),
            }
        }
    }

    if deleted == 0 && !result.has_failures() {
        result.add_message(CmdMessage::info("Nothing to clean up."));
    }

    Ok(result)
}
