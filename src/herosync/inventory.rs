//! # Inventory
//!
//! The inventory is the merged view of the three places a file can live: the
//! camera, the local `incoming/` staging dir, and the local `outgoing/` dir of
//! combined videos. It is rebuilt from scratch by every command and never
//! stored.
//!
//! ## Reconciliation
//!
//! | camera | incoming | sizes equal | status              |
//! |--------|----------|-------------|---------------------|
//! | yes    | no       |             | `OnlyRemote`        |
//! | no     | yes      |             | `OnlyLocalIncoming` |
//! | yes    | yes      | yes         | `InSync`            |
//! | yes    | yes      | no          | `OutOfSync`         |
//! | outgoing dir     |  |           | `Processed`         |
//!
//! A camera file and an incoming file with the same name collapse into one
//! record. Outgoing files are never matched against anything.
//!
//! Records are ordered by creation time, then filename.
//!
//! ## Filters
//!
//! Filters return a new inventory. The ones callers use to select a specific
//! group return [`HerosyncError::NoMatch`] when nothing is left, so "the
//! filter matched nothing" stays distinguishable from "there was nothing".

use crate::device::{MediaDevice, RemoteGroup};
use crate::error::{HerosyncError, Result};
use crate::model::{FileRecord, Status};
use crate::scan::{scan_dir, LocalListing};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    files: Vec<FileRecord>,
}

impl Inventory {
    /// Merges the three listings into one ordered inventory.
    pub fn build(
        remote: Vec<RemoteGroup>,
        mut incoming: LocalListing,
        incoming_dir: &Path,
        outgoing: LocalListing,
        outgoing_dir: &Path,
    ) -> Self {
        let mut files = Vec::new();

        for group in remote {
            for remote_file in group.files {
                let status = match incoming.remove(&remote_file.filename) {
                    Some(local) if local.size == remote_file.size => Status::InSync,
                    Some(_) => Status::OutOfSync,
                    None => Status::OnlyRemote,
                };
                files.push(FileRecord::new(
                    group.directory.clone(),
                    remote_file.filename,
                    remote_file.created_at,
                    remote_file.size,
                    status,
                ));
            }
        }

        let incoming_dir = incoming_dir.display().to_string();
        for (filename, local) in incoming {
            files.push(FileRecord::new(
                incoming_dir.clone(),
                filename,
                local.modified,
                local.size,
                Status::OnlyLocalIncoming,
            ));
        }

        let outgoing_dir = outgoing_dir.display().to_string();
        for (filename, local) in outgoing {
            files.push(FileRecord::new(
                outgoing_dir.clone(),
                filename,
                local.modified,
                local.size,
                Status::Processed,
            ));
        }

        Self::from_records(files)
    }

    /// Lists the camera, then incoming, then outgoing, and merges them.
    ///
    /// Any listing failure aborts the whole pass.
    pub fn load<D: MediaDevice + ?Sized>(device: &D, incoming_dir: &Path, outgoing_dir: &Path) -> Result<Self> {
        let remote = device.media_list()?;
        let incoming = scan_dir(incoming_dir)?;
        let outgoing = scan_dir(outgoing_dir)?;

        debug!(
            remote = remote.iter().map(|g| g.files.len()).sum::<usize>(),
            incoming = incoming.len(),
            outgoing = outgoing.len(),
            "building inventory"
        );

        Ok(Self::build(remote, incoming, incoming_dir, outgoing, outgoing_dir))
    }

    /// Outgoing files only; needs no camera.
    pub fn processed(outgoing_dir: &Path) -> Result<Self> {
        let outgoing = scan_dir(outgoing_dir)?;
        Ok(Self::build(
            Vec::new(),
            LocalListing::new(),
            Path::new(""),
            outgoing,
            outgoing_dir,
        ))
    }

    pub fn from_records(mut files: Vec<FileRecord>) -> Self {
        files.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Self { files }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn retain<F>(&self, keep: F) -> Vec<FileRecord>
    where
        F: Fn(&FileRecord) -> bool,
    {
        self.files.iter().filter(|f| keep(f)).cloned().collect()
    }

    /// Files created on `date` (UTC calendar day), excluding processed ones.
    pub fn filter_by_date(&self, date: NaiveDate) -> Result<Self> {
        let files = self.retain(|f| f.status != Status::Processed && f.created_at.date_naive() == date);
        if files.is_empty() {
            return Err(HerosyncError::NoMatch(format!("date: {}", date.format("%Y-%m-%d"))));
        }
        Ok(Self { files })
    }

    /// Files whose display line contains any of `terms`, ignoring case.
    ///
    /// No terms means no filtering.
    pub fn filter_by_keyword<S: AsRef<str>>(&self, terms: &[S]) -> Result<Self> {
        if terms.is_empty() {
            return Ok(self.clone());
        }

        let needles: Vec<String> = terms.iter().map(|t| t.as_ref().to_lowercase()).collect();
        let files = self.retain(|f| {
            let haystack = f.display_line().to_lowercase();
            needles.iter().any(|needle| haystack.contains(needle.as_str()))
        });

        if files.is_empty() {
            let joined: Vec<&str> = terms.iter().map(|t| t.as_ref()).collect();
            return Err(HerosyncError::NoMatch(format!("[{}]", joined.join(" "))));
        }
        Ok(Self { files })
    }

    /// Chapters of one recording, in chapter order.
    ///
    /// The order is the concatenation order used when combining.
    pub fn filter_by_media_id(&self, media_id: u32) -> Result<Self> {
        let mut chapters: Vec<(u32, FileRecord)> = self
            .files
            .iter()
            .filter(|f| f.status != Status::Processed)
            .filter_map(|f| {
                let info = f.info()?;
                (info.media_id == media_id).then(|| (info.chapter, f.clone()))
            })
            .collect();

        if chapters.is_empty() {
            return Err(HerosyncError::NoMatch(format!("Media ID: {}", media_id)));
        }

        chapters.sort_by_key(|(chapter, _)| *chapter);
        Ok(Self {
            files: chapters.into_iter().map(|(_, f)| f).collect(),
        })
    }

    /// Files with one of `statuses`. An empty slice keeps everything.
    pub fn filter_by_status(&self, statuses: &[Status]) -> Self {
        if statuses.is_empty() {
            return self.clone();
        }
        Self {
            files: self.retain(|f| statuses.contains(&f.status)),
        }
    }

    /// Distinct recording ids, ascending. Processed and non-camera names are skipped.
    pub fn media_ids(&self) -> Vec<u32> {
        self.files
            .iter()
            .filter(|f| f.status != Status::Processed)
            .filter_map(|f| f.info().map(|info| info.media_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct UTC creation dates, ascending, excluding processed files.
    pub fn unique_dates(&self) -> Vec<NaiveDate> {
        self.files
            .iter()
            .filter(|f| f.status != Status::Processed)
            .map(|f| f.created_at.date_naive())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// True if any file still needs downloading or has a size mismatch.
    pub fn has_unsynced_files(&self) -> bool {
        self.files
            .iter()
            .any(|f| !matches!(f.status, Status::InSync | Status::OnlyLocalIncoming))
    }

    pub fn count_by_status(&self, status: Status) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

impl IntoIterator for Inventory {
    type Item = FileRecord;
    type IntoIter = std::vec::IntoIter<FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::memory::fixtures::{at, DeviceFixture};
    use crate::device::RemoteFile;
    use crate::scan::LocalFile;
    use chrono::{DateTime, Utc};
    use std::fs;

    fn remote(directory: &str, files: &[(&str, DateTime<Utc>, u64)]) -> RemoteGroup {
        RemoteGroup {
            directory: directory.to_string(),
            files: files
                .iter()
                .map(|(name, created_at, size)| RemoteFile {
                    filename: name.to_string(),
                    created_at: *created_at,
                    size: *size,
                })
                .collect(),
        }
    }

    fn local(files: &[(&str, DateTime<Utc>, u64)]) -> LocalListing {
        files
            .iter()
            .map(|(name, modified, size)| {
                (
                    name.to_string(),
                    LocalFile {
                        size: *size,
                        modified: *modified,
                    },
                )
            })
            .collect()
    }

    fn sample() -> Inventory {
        Inventory::build(
            vec![remote(
                "100GOPRO",
                &[
                    ("GH010007.MP4", at(0), 1000),
                    ("GH020007.MP4", at(10), 2000),
                    ("GH010008.MP4", at(30), 3000),
                ],
            )],
            local(&[
                ("GH010007.MP4", at(100), 1000),
                ("GH020007.MP4", at(110), 1999),
                ("GH010009.MP4", at(40), 500),
            ]),
            Path::new("/media/incoming"),
            local(&[("gopro-0006.mp4", at(-60), 9000)]),
            Path::new("/media/outgoing"),
        )
    }

    fn status_of(inventory: &Inventory, filename: &str) -> Status {
        inventory
            .iter()
            .find(|f| f.filename == filename)
            .map(|f| f.status)
            .unwrap()
    }

    #[test]
    fn statuses_follow_presence_and_size() {
        let inventory = sample();
        assert_eq!(status_of(&inventory, "GH010007.MP4"), Status::InSync);
        assert_eq!(status_of(&inventory, "GH020007.MP4"), Status::OutOfSync);
        assert_eq!(status_of(&inventory, "GH010008.MP4"), Status::OnlyRemote);
        assert_eq!(status_of(&inventory, "GH010009.MP4"), Status::OnlyLocalIncoming);
        assert_eq!(status_of(&inventory, "gopro-0006.mp4"), Status::Processed);
    }

    #[test]
    fn remote_and_incoming_pairs_collapse() {
        // 3 remote + 3 incoming + 1 outgoing, with two shared names.
        let inventory = sample();
        assert_eq!(inventory.len(), 3 + 3 + 1 - 2);

        let names: BTreeSet<_> = inventory.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names.len(), inventory.len());
    }

    #[test]
    fn matched_files_keep_remote_time_and_directory() {
        let inventory = sample();
        let synced = inventory.iter().find(|f| f.filename == "GH010007.MP4").unwrap();
        assert_eq!(synced.directory, "100GOPRO");
        assert_eq!(synced.created_at, at(0));

        let local_only = inventory.iter().find(|f| f.filename == "GH010009.MP4").unwrap();
        assert_eq!(local_only.directory, "/media/incoming");
        assert_eq!(local_only.created_at, at(40));
    }

    #[test]
    fn ordered_by_time_then_name() {
        let inventory = Inventory::build(
            vec![remote("100GOPRO", &[("GH020001.MP4", at(5), 1), ("GH010001.MP4", at(5), 1)])],
            local(&[("GH010000.MP4", at(0), 1)]),
            Path::new("/in"),
            LocalListing::new(),
            Path::new("/out"),
        );
        let names: Vec<_> = inventory.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["GH010000.MP4", "GH010001.MP4", "GH020001.MP4"]);
    }

    #[test]
    fn building_twice_is_identical() {
        assert_eq!(sample(), sample());
    }

    #[test]
    fn media_id_filter_orders_by_chapter() {
        let inventory = Inventory::build(
            vec![remote(
                "100GOPRO",
                &[
                    ("GH030007.MP4", at(0), 1),
                    ("GH010007.MP4", at(1), 1),
                    ("GH020007.MP4", at(2), 1),
                    ("GH010008.MP4", at(3), 1),
                ],
            )],
            LocalListing::new(),
            Path::new("/in"),
            local(&[("GH040007.MP4", at(4), 1)]),
            Path::new("/out"),
        );

        let chapters = inventory.filter_by_media_id(7).unwrap();
        let names: Vec<_> = chapters.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["GH010007.MP4", "GH020007.MP4", "GH030007.MP4"]);

        assert!(inventory.filter_by_media_id(42).unwrap_err().is_no_match());
    }

    #[test]
    fn date_filter_excludes_processed() {
        let inventory = Inventory::build(
            Vec::new(),
            local(&[("GH010007.MP4", at(0), 1)]),
            Path::new("/in"),
            local(&[("gopro-0007.mp4", at(5), 1)]),
            Path::new("/out"),
        );

        let day = at(0).date_naive();
        let filtered = inventory.filter_by_date(day).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.files()[0].status, Status::OnlyLocalIncoming);

        let other_day = day.succ_opt().unwrap();
        assert!(inventory.filter_by_date(other_day).unwrap_err().is_no_match());
    }

    #[test]
    fn keyword_filter_matches_any_term_case_insensitively() {
        let inventory = sample();

        let all = inventory.filter_by_keyword::<&str>(&[]).unwrap();
        assert_eq!(all, inventory);

        let matched = inventory.filter_by_keyword(&["gh010008", "MISMATCHED"]).unwrap();
        let names: Vec<_> = matched.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["GH020007.MP4", "GH010008.MP4"]);

        assert!(inventory.filter_by_keyword(&["nothing-like-this"]).unwrap_err().is_no_match());
    }

    #[test]
    fn status_filter_with_no_statuses_keeps_everything() {
        let inventory = sample();
        assert_eq!(inventory.filter_by_status(&[]).len(), inventory.len());

        let remote_only = inventory.filter_by_status(&[Status::OnlyRemote]);
        assert_eq!(remote_only.len(), 1);
        assert!(inventory.filter_by_status(&[Status::InSync, Status::Processed]).len() == 2);
    }

    #[test]
    fn grouping_keys_skip_processed_and_foreign_names() {
        let inventory = Inventory::build(
            vec![remote("100GOPRO", &[("GH010008.MP4", at(0), 1), ("GH010007.MP4", at(1), 1)])],
            local(&[("notes.txt", at(2), 1), ("GH020007.MP4", at(3), 1)]),
            Path::new("/in"),
            local(&[("GH010009.MP4", at(60 * 24 * 3), 1)]),
            Path::new("/out"),
        );

        assert_eq!(inventory.media_ids(), vec![7, 8]);
        assert_eq!(inventory.unique_dates(), vec![at(0).date_naive()]);
    }

    #[test]
    fn totals_and_unsynced_gate() {
        let inventory = sample();
        assert_eq!(inventory.total_size(), 1000 + 2000 + 3000 + 500 + 9000);
        assert!(inventory.has_unsynced_files());

        let ready = inventory.filter_by_status(&[Status::InSync, Status::OnlyLocalIncoming]);
        assert!(!ready.has_unsynced_files());
    }

    #[test]
    fn download_round_trip_turns_remote_into_in_sync() {
        let temp = tempfile::tempdir().unwrap();
        let incoming = temp.path().join("incoming");
        let outgoing = temp.path().join("outgoing");
        let device = DeviceFixture::new().with_recording(7, 1, at(0), 1000).build();

        let before = Inventory::load(&device, &incoming, &outgoing).unwrap();
        assert_eq!(before.len(), 1);
        let record = &before.files()[0];
        assert_eq!(record.status, Status::OnlyRemote);
        assert_eq!(record.size, 1000);
        assert_eq!(record.created_at, at(0));

        fs::create_dir_all(&incoming).unwrap();
        fs::write(incoming.join("GH010007.MP4"), vec![0u8; 1000]).unwrap();

        let after = Inventory::load(&device, &incoming, &outgoing).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after.files()[0].status, Status::InSync);
    }

    #[test]
    fn scan_failure_aborts_the_pass() {
        let temp = tempfile::tempdir().unwrap();
        let incoming = temp.path().join("incoming");
        fs::write(&incoming, b"not a directory").unwrap();
        let device = DeviceFixture::new().with_recording(7, 1, at(0), 10).build();

        let err = Inventory::load(&device, &incoming, &temp.path().join("outgoing")).unwrap_err();
        assert_eq!(err.kind(), "scan-failure");
    }

    #[test]
    fn processed_inventory_reads_outgoing_only() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("gopro-0007.mp4"), b"abc").unwrap();

        let inventory = Inventory::processed(temp.path()).unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.files()[0].status, Status::Processed);
        assert_eq!(inventory.files()[0].size, 3);
    }
}
