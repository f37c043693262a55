//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every herosync operation, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** to the matching `commands::*::run`
//! - **Owns** the device handle and the staging paths so callers don't thread
//!   them through every call
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no business logic, no terminal I/O and no formatting.
//!
//! ## Generic Over MediaDevice
//!
//! `HerosyncApi<D: MediaDevice>` is generic over the camera backend:
//! - Production: `HerosyncApi<GoProClient>`
//! - Testing: `HerosyncApi<InMemoryDevice>`
//!
//! Publishing only reads `outgoing/` and never talks to the camera, so it is
//! also offered as the free function [`publish`] for callers that have no
//! device at hand.

use crate::cancel::CancelToken;
use crate::combiner::Combiner;
use crate::commands;
use crate::config::VideoConfig;
use crate::device::MediaDevice;
use crate::error::Result;
use crate::publisher::Publisher;
use tracing::warn;

pub struct HerosyncApi<D: MediaDevice> {
    device: D,
    paths: MediaPaths,
}

impl<D: MediaDevice> HerosyncApi<D> {
    pub fn new(device: D, paths: MediaPaths) -> Self {
        Self { device, paths }
    }

    pub fn status(&self) -> Result<CmdResult> {
        commands::status::run(&self.device, &self.paths)
    }

    pub fn list<S: AsRef<str>>(&self, terms: &[S]) -> Result<CmdResult> {
        commands::list::run(&self.device, &self.paths, terms)
    }

    pub fn download(&mut self, options: &DownloadOptions, cancel: &CancelToken) -> Result<CmdResult> {
        commands::download::run(&mut self.device, &self.paths, options, cancel)
    }

    pub fn combine<C: Combiner + ?Sized>(
        &self,
        options: &CombineOptions,
        combiner: &C,
        cancel: &CancelToken,
    ) -> Result<CmdResult> {
        commands::combine::run(&self.device, &self.paths, options, combiner, cancel)
    }

    pub fn publish<P: Publisher + ?Sized, S: AsRef<str>>(
        &self,
        terms: &[S],
        video: &VideoConfig,
        publisher: &P,
        cancel: &CancelToken,
    ) -> Result<CmdResult> {
        publish(&self.paths, terms, video, publisher, cancel)
    }

    pub fn cleanup(&mut self, options: &CleanupOptions) -> Result<CmdResult> {
        commands::cleanup::run(&mut self.device, &self.paths, options)
    }

    /// Download, combine, then publish everything, stopping after the first
    /// step that reports a failure.
    pub fn yolo<C, P>(
        &mut self,
        combine: &CombineOptions,
        combiner: &C,
        video: &VideoConfig,
        publisher: &P,
        cancel: &CancelToken,
    ) -> Result<CmdResult>
    where
        C: Combiner + ?Sized,
        P: Publisher + ?Sized,
    {
        let mut result = self.download(&DownloadOptions::default(), cancel)?;
        if result.has_failures() {
            warn!("download reported failures; not combining");
            return Ok(result);
        }

        result.merge(self.combine(combine, combiner, cancel)?);
        if result.has_failures() {
            warn!("combine reported failures; not publishing");
            return Ok(result);
        }

        result.merge(self.publish::<_, &str>(&[], video, publisher, cancel)?);
        Ok(result)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn paths(&self) -> &MediaPaths {
        &self.paths
    }
}

/// Uploads processed videos; needs no camera.
pub fn publish<P: Publisher + ?Sized, S: AsRef<str>>(
    paths: &MediaPaths,
    terms: &[S],
    video: &VideoConfig,
    publisher: &P,
    cancel: &CancelToken,
) -> Result<CmdResult> {
    commands::publish::run(paths, terms, video, publisher, cancel)
}

pub use commands::cleanup::CleanupOptions;
pub use commands::combine::CombineOptions;
pub use commands::download::DownloadOptions;
pub use commands::status::StatusReport;
pub use commands::{CmdMessage, CmdResult, MediaPaths, MessageLevel};
