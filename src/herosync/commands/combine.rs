//! Merge chapter files from `incoming/` into single videos in `outgoing/`.

use super::{CmdMessage, CmdResult, MediaPaths};
use crate::cancel::CancelToken;
use crate::combiner::Combiner;
use crate::config::GroupBy;
use crate::device::MediaDevice;
use crate::error::{HerosyncError, Result};
use crate::inventory::Inventory;
use chrono::NaiveDate;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Allowed relative difference between the output and the summed inputs.
const SIZE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Default)]
pub struct CombineOptions {
    pub group_by: GroupBy,
    pub keep_originals: bool,
}

/// One group of chapters to combine.
enum GroupKey {
    MediaId(u32),
    Date(NaiveDate),
}

impl GroupKey {
    fn output_filename(&self) -> String {
        match self {
            GroupKey::MediaId(id) => format!("gopro-{:04}.mp4", id),
            GroupKey::Date(date) => format!("daily-{}.mp4", date.format("%Y-%m-%d")),
        }
    }

    fn select(&self, inventory: &Inventory) -> Result<Inventory> {
        match self {
            GroupKey::MediaId(id) => inventory.filter_by_media_id(*id),
            GroupKey::Date(date) => inventory.filter_by_date(*date),
        }
    }

    fn label(&self) -> String {
        match self {
            GroupKey::MediaId(id) => format!("media ID {}", id),
            GroupKey::Date(date) => format!("date {}", date.format("%Y-%m-%d")),
        }
    }
}

pub fn run<D, C>(
    device: &D,
    paths: &MediaPaths,
    options: &CombineOptions,
    combiner: &C,
    cancel: &CancelToken,
) -> Result<CmdResult>
where
    D: MediaDevice + ?Sized,
    C: Combiner + ?Sized,
{
    let inventory = Inventory::load(device, &paths.incoming, &paths.outgoing)?;

    let groups: Vec<GroupKey> = match options.group_by {
        GroupBy::MediaId => inventory.media_ids().into_iter().map(GroupKey::MediaId).collect(),
        GroupBy::Date => inventory.unique_dates().into_iter().map(GroupKey::Date).collect(),
    };

    let mut result = CmdResult::default();
    if groups.is_empty() {
        result.add_message(CmdMessage::info("Nothing to combine."));
        return Ok(result);
    }

    for key in groups {
        cancel.check()?;

        let group = match key.select(&inventory) {
            Ok(group) => group,
            Err(e) if e.is_no_match() => continue,
            Err(e) => return Err(e),
        };

        if group.has_unsynced_files() {
            warn!(group = %key.label(), "skipping; not all chapters have been downloaded");
            result.add_message(CmdMessage::warning(format!(
                "Skipping {}: not all chapters have been downloaded.",
                key.label()
            )));
            continue;
        }

        match combine_group(&key, &group, paths, options.keep_originals, combiner) {
            Ok(Some(output)) => {
                result.add_message(CmdMessage::success(format!(
                    "Combined {} into {}",
                    key.label(),
                    output.display()
                )));
                result.affected_paths.push(output);
            }
            Ok(None) => debug!(group = %key.label(), "no video chapters in group"),
            Err(e) => result.add_failure(&key.label(), &e),
        }
    }

    Ok(result)
}

fn combine_group<C: Combiner + ?Sized>(
    key: &GroupKey,
    group: &Inventory,
    paths: &MediaPaths,
    keep_originals: bool,
    combiner: &C,
) -> Result<Option<PathBuf>> {
    // Thumbnails and low-res proxies share the media id; only MP4 chapters are joined.
    let chapters: Vec<_> = group
        .iter()
        .filter(|f| f.info().is_some_and(|info| info.extension == "MP4"))
        .collect();
    let Some(first) = chapters.first() else {
        return Ok(None);
    };

    let inputs: Vec<PathBuf> = chapters
        .iter()
        .map(|f| paths.incoming.join(&f.filename))
        .collect();
    let expected: u64 = chapters.iter().map(|f| f.size).sum();

    fs::create_dir_all(&paths.outgoing)?;
    let output = unique_output_path(&paths.outgoing, &key.output_filename());
    info!(output = %output.display(), chapters = inputs.len(), "combining");

    combiner.combine(&inputs, &output)?;

    let mtime = FileTime::from_unix_time(first.created_at.timestamp(), first.created_at.timestamp_subsec_nanos());
    filetime::set_file_mtime(&output, mtime)?;

    if let Err(e) = verify_size(&output, expected) {
        let _ = fs::remove_file(&output);
        return Err(e);
    }

    if !keep_originals {
        for input in &inputs {
            fs::remove_file(input)?;
            info!(path = %input.display(), "local file deleted");
        }
    }

    Ok(Some(output))
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` for the first free `n`.
pub fn unique_output_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = name.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

fn verify_size(path: &Path, expected: u64) -> Result<()> {
    let actual = fs::metadata(path)?.len();
    let diff = actual.abs_diff(expected) as f64;
    if expected == 0 || diff / expected as f64 > SIZE_TOLERANCE {
        return Err(HerosyncError::Verification(format!(
            "{}: size {} is not within {:.0}% of expected {}",
            path.display(),
            actual,
            SIZE_TOLERANCE * 100.0,
            expected
        )));
    }
    Ok(())
}
