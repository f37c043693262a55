//! Upload combined videos from `outgoing/`.
//!
//! A video counts as already published when the channel has one with the same
//! recording date and the same rendered title, so re-running never uploads
//! twice.

use super::{CmdMessage, CmdResult, MediaPaths};
use crate::cancel::CancelToken;
use crate::config::VideoConfig;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::publisher::{render_title, Publisher, VideoMetadata};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub fn run<P: Publisher + ?Sized, S: AsRef<str>>(
    paths: &MediaPaths,
    terms: &[S],
    video: &VideoConfig,
    publisher: &P,
    cancel: &CancelToken,
) -> Result<CmdResult> {
    let ready = Inventory::processed(&paths.outgoing)?.filter_by_keyword(terms)?;

    let mut result = CmdResult::default();
    if ready.is_empty() {
        result.add_message(CmdMessage::info("Nothing to publish."));
        return Ok(result);
    }

    let mut published: HashSet<(Option<NaiveDate>, String)> = publisher
        .uploaded()?
        .into_iter()
        .map(|video| (video.recording_date, video.title))
        .collect();

    for record in &ready {
        cancel.check()?;

        let title = render_title(&video.title, &record.filename);
        let key = (Some(record.created_at.date_naive()), title.clone());
        if published.contains(&key) {
            info!(filename = %record.filename, %title, "skipping already uploaded video");
            result.add_message(CmdMessage::info(format!(
                "Skipping {}: already published as \"{}\".",
                record.filename, title
            )));
            continue;
        }

        let metadata = VideoMetadata {
            title: title.clone(),
            description: video.description.clone(),
            tags: video.tag_list(),
            category_id: video.category_id.clone(),
            privacy_status: video.privacy_status,
            recording_date: record.created_at,
        };

        info!(filename = %record.filename, %title, "uploading video");
        let path = Path::new(&record.directory).join(&record.filename);
        match publisher.upload(&path, &metadata) {
            Ok(id) => {
                info!(%title, video_id = %id, "video uploaded");
                result.add_message(CmdMessage::success(format!(
                    "Published {} as \"{}\" ({})",
                    record.filename, title, id
                )));
                result.uploaded.push((record.filename.clone(), id));
                published.insert(key);
            }
            Err(e) => result.add_failure(&record.filename, &e),
        }
    }

    Ok(result)
}
