//! Uploading combined videos.
//!
//! [`YouTubePublisher`] talks to the YouTube Data API v3 with a bearer token
//! supplied through configuration, using the resumable upload protocol:
//! <https://developers.google.com/youtube/v3/guides/using_resumable_upload_protocol>

use crate::config::PrivacyStatus;
use crate::error::{HerosyncError, Result};
use crate::progress::ProgressReader;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::{Body, Client, Response};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// A video already on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    pub title: String,
    pub recording_date: Option<NaiveDate>,
}

/// Everything sent along with the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub privacy_status: PrivacyStatus,
    pub recording_date: DateTime<Utc>,
}

pub trait Publisher {
    /// Recently uploaded videos, for duplicate detection.
    fn uploaded(&self) -> Result<Vec<UploadedVideo>>;

    /// Uploads one file and returns its remote id.
    fn upload(&self, path: &Path, metadata: &VideoMetadata) -> Result<String>;
}

static COUNTER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(\d+)$").expect("valid pattern"));
static MEDIA_ID_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^gopro-0*(\d+)$").expect("valid pattern"));
static DAILY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^daily-(\d{4}-\d{2}-\d{2})$").expect("valid pattern"));

/// Fills `${identifier}`, `${type}`, `${media_id}`, `${date}` and `${counter}`
/// from a combined video's filename.
///
/// `gopro-0007_2.mp4` gives identifier `7`, type `chapters`, counter `2`;
/// `daily-2025-01-15.mp4` gives identifier and date `2025-01-15`, type `date`.
/// Any other name is used whole as the identifier, with type `unknown`.
pub fn render_title(template: &str, filename: &str) -> String {
    let mut stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let suffix = COUNTER_SUFFIX
        .captures(&stem)
        .map(|caps| (caps[1].to_string(), caps[0].len()));
    let mut counter = String::new();
    if let Some((digits, suffix_len)) = suffix {
        counter = digits;
        stem.truncate(stem.len() - suffix_len);
    }

    let (kind, identifier, media_id, date) = if let Some(caps) = MEDIA_ID_NAME.captures(&stem) {
        ("chapters", caps[1].to_string(), caps[1].to_string(), String::new())
    } else if let Some(caps) = DAILY_NAME.captures(&stem) {
        ("date", caps[1].to_string(), String::new(), caps[1].to_string())
    } else {
        ("unknown", stem.clone(), String::new(), String::new())
    };

    template
        .replace("${identifier}", &identifier)
        .replace("${type}", kind)
        .replace("${media_id}", &media_id)
        .replace("${date}", &date)
        .replace("${counter}", &counter)
        .trim()
        .to_string()
}

pub struct YouTubePublisher {
    http: Client,
    token: String,
    api_base: String,
    upload_base: String,
}

impl YouTubePublisher {
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_endpoints(access_token, API_BASE, UPLOAD_BASE)
    }

    /// Points the client at other API roots, such as a local test server.
    pub fn with_endpoints(access_token: &str, api_base: &str, upload_base: &str) -> Result<Self> {
        if access_token.trim().is_empty() {
            return Err(HerosyncError::Publish(
                "no YouTube access token; set youtube.access_token or HEROSYNC_YOUTUBE_ACCESS_TOKEN"
                    .to_string(),
            ));
        }

        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            http,
            token: access_token.trim().to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        })
    }

    fn check(resp: Response, context: &str) -> Result<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        Err(HerosyncError::Publish(format!(
            "{}: unexpected status {}, body: {}",
            context,
            status.as_u16(),
            body.trim()
        )))
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, context: &str) -> Result<T> {
        debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .timeout(API_TIMEOUT)
            .send()?;
        Ok(Self::check(resp, context)?.json()?)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    #[serde(default)]
    id: String,
    snippet: Option<Snippet>,
    recording_details: Option<RecordingDetails>,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordingDetails {
    recording_date: Option<String>,
}

impl From<VideoResource> for UploadedVideo {
    fn from(video: VideoResource) -> Self {
        let recording_date = video
            .recording_details
            .and_then(|details| details.recording_date)
            .and_then(|date| DateTime::parse_from_rfc3339(&date).ok())
            .map(|date| date.with_timezone(&Utc).date_naive());

        Self {
            title: video.snippet.map(|s| s.title).unwrap_or_default(),
            recording_date,
        }
    }
}

/// Request body of `videos.insert`.
fn insert_body(metadata: &VideoMetadata) -> serde_json::Value {
    let mut snippet = json!({
        "title": metadata.title,
        "description": metadata.description,
        "categoryId": metadata.category_id,
    });
    // The API rejects an empty tag list given as "".
    if !metadata.tags.is_empty() {
        snippet["tags"] = json!(metadata.tags);
    }

    json!({
        "snippet": snippet,
        "status": { "privacyStatus": metadata.privacy_status.to_string() },
        "recordingDetails": { "recordingDate": metadata.recording_date.to_rfc3339() },
    })
}

impl Publisher for YouTubePublisher {
    fn uploaded(&self) -> Result<Vec<UploadedVideo>> {
        let search: SearchResponse = self.get_json(
            &format!(
                "{}/search?part=snippet&forMine=true&type=video&order=date&maxResults=50",
                self.api_base
            ),
            "listing uploaded videos",
        )?;

        let ids: Vec<String> = search.items.into_iter().filter_map(|item| item.id.video_id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos: VideoListResponse = self.get_json(
            &format!(
                "{}/videos?part=snippet,recordingDetails&id={}",
                self.api_base,
                ids.join(",")
            ),
            "fetching video details",
        )?;
        Ok(videos.items.into_iter().map(UploadedVideo::from).collect())
    }

    fn upload(&self, path: &Path, metadata: &VideoMetadata) -> Result<String> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let start = self
            .http
            .post(format!(
                "{}/videos?uploadType=resumable&part=snippet,status,recordingDetails",
                self.upload_base
            ))
            .bearer_auth(&self.token)
            .timeout(API_TIMEOUT)
            .header("X-Upload-Content-Length", size)
            .header("X-Upload-Content-Type", "video/mp4")
            .json(&insert_body(metadata))
            .send()?;
        let start = Self::check(start, "starting upload")?;

        let session = start
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| HerosyncError::Publish("upload session has no Location header".to_string()))?;
        debug!(%session, "upload session opened");

        let reader = ProgressReader::new(file, "upload", filename, size);
        let resp = self
            .http
            .put(&session)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "video/mp4")
            .header(CONTENT_LENGTH, size)
            .body(Body::sized(reader, size))
            .send()?;

        let video: VideoResource = Self::check(resp, "uploading video")?.json()?;
        if video.id.is_empty() {
            return Err(HerosyncError::Publish("upload response carried no video id".to_string()));
        }
        Ok(video.id)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use std::cell::RefCell;

    /// Records uploads instead of sending them.
    #[derive(Default)]
    pub struct RecordingPublisher {
        pub existing: Vec<UploadedVideo>,
        pub fail_titles: Vec<String>,
        pub uploads: RefCell<Vec<(String, VideoMetadata)>>,
    }

    impl Publisher for RecordingPublisher {
        fn uploaded(&self) -> Result<Vec<UploadedVideo>> {
            Ok(self.existing.clone())
        }

        fn upload(&self, path: &Path, metadata: &VideoMetadata) -> Result<String> {
            if self.fail_titles.contains(&metadata.title) {
                return Err(HerosyncError::Publish("uploading video: unexpected status 400".to_string()));
            }
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut uploads = self.uploads.borrow_mut();
            uploads.push((filename, metadata.clone()));
            Ok(format!("video-{}", uploads.len()))
        }
    }
}
