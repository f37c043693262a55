use super::{CameraState, Download, HardwareInfo, MediaDevice, RemoteFile, RemoteGroup};
use crate::error::{HerosyncError, Result};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;

struct StoredFile {
    created_at: DateTime<Utc>,
    /// Size the listing reports, which may disagree with `body.len()`.
    reported_size: u64,
    body: Vec<u8>,
}

/// In-memory camera for testing.
/// Listings are already UTC-corrected.
#[derive(Default)]
pub struct InMemoryDevice {
    files: BTreeMap<(String, String), StoredFile>,
    failing_downloads: HashSet<String>,
    turbo_calls: RefCell<Vec<bool>>,
    deleted: Vec<(String, String)>,
    hardware: HardwareInfo,
    state: CameraState,
}

impl InMemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, directory: &str, filename: &str, created_at: DateTime<Utc>, body: Vec<u8>) {
        let reported_size = body.len() as u64;
        self.add_file_with_size(directory, filename, created_at, reported_size, body);
    }

    /// Adds a file whose listed size differs from the bytes actually served.
    pub fn add_file_with_size(
        &mut self,
        directory: &str,
        filename: &str,
        created_at: DateTime<Utc>,
        reported_size: u64,
        body: Vec<u8>,
    ) {
        self.files.insert(
            (directory.to_string(), filename.to_string()),
            StoredFile {
                created_at,
                reported_size,
                body,
            },
        );
    }

    /// Makes every download of `filename` fail.
    pub fn fail_download(&mut self, filename: &str) {
        self.failing_downloads.insert(filename.to_string());
    }

    pub fn set_hardware_info(&mut self, hardware: HardwareInfo) {
        self.hardware = hardware;
    }

    pub fn set_camera_state(&mut self, state: CameraState) {
        self.state = state;
    }

    pub fn contains(&self, directory: &str, filename: &str) -> bool {
        self.files
            .contains_key(&(directory.to_string(), filename.to_string()))
    }

    /// `(directory, filename)` pairs deleted so far, in order.
    pub fn deleted(&self) -> &[(String, String)] {
        &self.deleted
    }

    /// Every turbo transfer toggle requested so far, in order.
    pub fn turbo_calls(&self) -> Vec<bool> {
        self.turbo_calls.borrow().clone()
    }
}

impl MediaDevice for InMemoryDevice {
    fn base_url(&self) -> String {
        "memory://gopro/".to_string()
    }

    fn media_list(&self) -> Result<Vec<RemoteGroup>> {
        let mut groups: Vec<RemoteGroup> = Vec::new();
        for ((directory, filename), file) in &self.files {
            let remote = RemoteFile {
                filename: filename.clone(),
                created_at: file.created_at,
                size: file.reported_size,
            };
            match groups.last_mut() {
                Some(group) if group.directory == *directory => group.files.push(remote),
                _ => groups.push(RemoteGroup {
                    directory: directory.clone(),
                    files: vec![remote],
                }),
            }
        }
        Ok(groups)
    }

    fn hardware_info(&self) -> Result<HardwareInfo> {
        Ok(self.hardware.clone())
    }

    fn camera_state(&self) -> Result<CameraState> {
        Ok(self.state)
    }

    fn configure_turbo_transfer(&self, enable: bool) -> Result<()> {
        self.turbo_calls.borrow_mut().push(enable);
        Ok(())
    }

    fn open_download(&self, directory: &str, filename: &str) -> Result<Download> {
        if self.failing_downloads.contains(filename) {
            return Err(HerosyncError::Listing(format!(
                "downloading file: unexpected status 500, body: {}",
                filename
            )));
        }

        let file = self
            .files
            .get(&(directory.to_string(), filename.to_string()))
            .ok_or_else(|| {
                HerosyncError::Listing(format!(
                    "downloading file: unexpected status 404, body: {}/{}",
                    directory, filename
                ))
            })?;

        Ok(Download {
            reader: Box::new(Cursor::new(file.body.clone())),
            content_length: Some(file.body.len() as u64),
        })
    }

    fn delete_file(&mut self, directory: &str, filename: &str) -> Result<()> {
        let key = (directory.to_string(), filename.to_string());
        if self.files.remove(&key).is_none() {
            return Err(HerosyncError::Listing(format!(
                "deleting file: unexpected status 404, body: {}/{}",
                directory, filename
            )));
        }
        self.deleted.push(key);
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// 2025-01-15 09:00:00 UTC, plus `minutes`.
    pub fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    pub struct DeviceFixture {
        pub device: InMemoryDevice,
    }

    impl Default for DeviceFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DeviceFixture {
        pub fn new() -> Self {
            Self {
                device: InMemoryDevice::new(),
            }
        }

        /// Adds `count` chapters of one recording to `100GOPRO`, ten minutes apart,
        /// each with a body of `size` bytes.
        pub fn with_recording(mut self, media_id: u32, count: u32, start: DateTime<Utc>, size: usize) -> Self {
            for chapter in 1..=count {
                let filename = format!("GH{:02}{:04}.MP4", chapter, media_id);
                let created = start + chrono::Duration::minutes(10 * i64::from(chapter - 1));
                self.device
                    .add_file("100GOPRO", &filename, created, vec![chapter as u8; size]);
            }
            self
        }

        pub fn build(self) -> InMemoryDevice {
            self.device
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::io::Read;

    #[test]
    fn lists_files_grouped_by_directory() {
        let mut device = DeviceFixture::new().with_recording(7, 2, at(0), 10).build();
        device.add_file("101GOPRO", "GH010008.MP4", at(60), vec![0; 5]);

        let groups = device.media_list().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].directory, "100GOPRO");
        assert_eq!(groups[0].files.len(), 2);
        assert_eq!(groups[1].files[0].size, 5);
    }

    #[test]
    fn download_serves_body_and_delete_is_tracked() {
        let mut device = DeviceFixture::new().with_recording(7, 1, at(0), 3).build();

        let mut body = Vec::new();
        device
            .open_download("100GOPRO", "GH010007.MP4")
            .unwrap()
            .reader
            .read_to_end(&mut body)
            .unwrap();
        assert_eq!(body, vec![1, 1, 1]);

        device.delete_file("100GOPRO", "GH010007.MP4").unwrap();
        assert!(!device.contains("100GOPRO", "GH010007.MP4"));
        assert_eq!(device.deleted().len(), 1);
        assert!(device.delete_file("100GOPRO", "GH010007.MP4").is_err());
    }
}
