//! Open GoPro HTTP client.
//!
//! API reference: <https://gopro.github.io/OpenGoPro/http>

use super::wire::{self, CameraDateTime, CameraState, HardwareInfo, MediaList};
use super::{Download, MediaDevice, RemoteGroup};
use crate::error::{HerosyncError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const API_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 4;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

pub struct GoProClient {
    http: Client,
    base: Url,
}

impl GoProClient {
    pub fn new(base: Url) -> Result<Self> {
        // No overall timeout: downloads of multi-gigabyte chapters run for minutes.
        // The camera is always on the local link, never behind a proxy.
        let http = Client::builder()
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path_and_query: &str) -> String {
        // Built by hand so the `path=` query keeps its literal slash.
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path_and_query)
    }

    /// GET with bounded retries on connection failures and 5xx responses.
    fn get(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;

        loop {
            let mut request = self.http.get(url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }

            let retryable = match request.send() {
                Ok(resp) if resp.status().is_server_error() && attempt < MAX_ATTEMPTS => {
                    format!("server returned {}", resp.status())
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < MAX_ATTEMPTS => e.to_string(),
                Err(e) => return Err(e.into()),
            };

            warn!(url, attempt, error = %retryable, "request failed, retrying");
            thread::sleep(backoff);
            backoff *= 2;
            attempt += 1;
        }
    }

    fn get_ok(&self, url: &str, timeout: Option<Duration>, context: &str) -> Result<Response> {
        let resp = self.get(url, timeout)?;
        if resp.status() != StatusCode::OK {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(HerosyncError::Listing(format!(
                "{}: unexpected status {}, body: {}",
                context,
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(resp)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let body = self.get_ok(&url, Some(API_TIMEOUT), context)?.text()?;
        serde_json::from_str(&body)
            .map_err(|e| HerosyncError::Listing(format!("{}: malformed response: {}", context, e)))
    }
}

impl MediaDevice for GoProClient {
    fn base_url(&self) -> String {
        self.base.to_string()
    }

    fn media_list(&self) -> Result<Vec<RemoteGroup>> {
        let list: MediaList = self.get_json("gopro/media/list", "getting media list")?;
        if list.is_empty() {
            return Ok(Vec::new());
        }

        let date_time: CameraDateTime =
            self.get_json("gopro/camera/get_date_time", "getting camera date and time")?;
        debug!(tz_offset_minutes = date_time.tz_offset_minutes, "camera timezone");

        wire::normalize_media_list(list, date_time.tz_offset_minutes)
    }

    fn hardware_info(&self) -> Result<HardwareInfo> {
        self.get_json("gopro/camera/info", "getting hardware info")
    }

    fn camera_state(&self) -> Result<CameraState> {
        self.get_json("gopro/camera/state", "getting camera state")
    }

    fn configure_turbo_transfer(&self, enable: bool) -> Result<()> {
        let url = self.url(&format!("gopro/media/turbo_transfer?p={}", u8::from(enable)));
        debug!(%url, enable, "configuring turbo transfer");
        self.get_ok(&url, Some(API_TIMEOUT), "configuring turbo transfer mode")?;
        Ok(())
    }

    fn open_download(&self, directory: &str, filename: &str) -> Result<Download> {
        let url = self.url(&format!("videos/DCIM/{}/{}", directory, filename));
        debug!(%url, "downloading");
        let resp = self.get_ok(&url, None, "downloading file")?;
        let content_length = resp.content_length();

        Ok(Download {
            reader: Box::new(resp),
            content_length,
        })
    }

    fn delete_file(&mut self, directory: &str, filename: &str) -> Result<()> {
        let url = self.url(&format!("gopro/media/delete/file?path={}/{}", directory, filename));
        debug!(%url, "deleting remote file");
        self.get_ok(&url, Some(API_TIMEOUT), "deleting file")?;
        Ok(())
    }
}
