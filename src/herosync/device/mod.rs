//! # Device Layer
//!
//! The camera is abstracted behind the [`MediaDevice`] trait so that the
//! inventory and every command can run against either the real camera or an
//! in-memory stand-in.
//!
//! ## Implementations
//!
//! - [`gopro::GoProClient`]: the Open GoPro HTTP API, used in production.
//! - [`memory::InMemoryDevice`]: canned listings and file bodies for tests.
//!
//! ## Normalized Listing
//!
//! Whatever the wire format looks like, a device hands back a list of
//! [`RemoteGroup`]s: one per camera folder (`100GOPRO`, `101GOPRO`, ...), each
//! holding files whose `created_at` has already been shifted from camera-local
//! time to UTC.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::io::Read;

pub mod gopro;
pub mod memory;
pub mod wire;

pub use wire::{CameraState, HardwareInfo};

/// A file as reported by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}

/// All files in one camera folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGroup {
    pub directory: String,
    pub files: Vec<RemoteFile>,
}

/// An open download stream.
pub struct Download {
    pub reader: Box<dyn Read + Send>,
    /// Byte count announced by the camera, when it sent one.
    pub content_length: Option<u64>,
}

/// Abstract interface to the capture device.
pub trait MediaDevice {
    /// Base address the device is reached at, for display.
    fn base_url(&self) -> String;

    /// List all media, grouped per folder, with UTC creation times.
    fn media_list(&self) -> Result<Vec<RemoteGroup>>;

    fn hardware_info(&self) -> Result<HardwareInfo>;

    fn camera_state(&self) -> Result<CameraState>;

    /// Toggle the camera's high-throughput transfer mode.
    fn configure_turbo_transfer(&self, enable: bool) -> Result<()>;

    /// Open a stream over one file's contents.
    fn open_download(&self, directory: &str, filename: &str) -> Result<Download>;

    /// Delete a single file from the camera.
    fn delete_file(&mut self, directory: &str, filename: &str) -> Result<()>;
}
