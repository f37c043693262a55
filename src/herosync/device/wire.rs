//! Wire shapes of the Open GoPro HTTP API.
//!
//! Only the fields herosync needs are parsed. See
//! <https://gopro.github.io/OpenGoPro/http#tag/Models> for the full models.
//!
//! Firmware versions disagree on whether numeric fields are JSON numbers or
//! numeric strings, so every number goes through [`lenient_number`].

use super::{RemoteFile, RemoteGroup};
use crate::error::{HerosyncError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

/// Accepts `123` as well as `"123"`.
pub fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", text, e))),
    }
}

/// Response of `/gopro/media/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaList {
    #[serde(default)]
    pub media: Vec<MediaDirectory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaDirectory {
    #[serde(rename = "d")]
    pub directory: String,
    #[serde(rename = "fs", default)]
    pub items: Vec<MediaItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "n")]
    pub filename: String,
    /// Seconds since the epoch, in camera-local wall-clock time.
    #[serde(rename = "cre", deserialize_with = "lenient_number")]
    pub created: i64,
    #[serde(rename = "s", deserialize_with = "lenient_number")]
    pub size: u64,
}

impl MediaList {
    pub fn is_empty(&self) -> bool {
        self.media.iter().all(|dir| dir.items.is_empty())
    }
}

/// Response of `/gopro/camera/get_date_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraDateTime {
    /// Offset from UTC in minutes.
    #[serde(rename = "tzone", deserialize_with = "lenient_number")]
    pub tz_offset_minutes: i64,
}

/// Response of `/gopro/camera/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HardwareInfo {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub firmware_version: String,
}

/// SD card usage from `/gopro/camera/state`, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCameraState")]
pub struct CameraState {
    pub sd_capacity: u64,
    pub sd_remaining: u64,
}

#[derive(Deserialize)]
struct RawCameraState {
    status: RawCameraStatus,
}

// The camera reports storage in kilobytes under numeric status ids.
#[derive(Deserialize)]
struct RawCameraStatus {
    #[serde(rename = "117", default, deserialize_with = "lenient_number")]
    capacity_kb: u64,
    #[serde(rename = "54", default, deserialize_with = "lenient_number")]
    remaining_kb: u64,
}

const BYTES_PER_KB: u64 = 1000;

impl From<RawCameraState> for CameraState {
    fn from(raw: RawCameraState) -> Self {
        Self {
            sd_capacity: raw.status.capacity_kb.saturating_mul(BYTES_PER_KB),
            sd_remaining: raw.status.remaining_kb.saturating_mul(BYTES_PER_KB),
        }
    }
}

/// Converts a wire listing into UTC-stamped groups.
///
/// The camera stamps files with its local wall-clock time as if it were UTC;
/// subtracting the camera's offset recovers the real instant.
pub fn normalize_media_list(list: MediaList, tz_offset_minutes: i64) -> Result<Vec<RemoteGroup>> {
    let shift = TimeDelta::try_minutes(tz_offset_minutes)
        .ok_or_else(|| HerosyncError::Listing(format!("invalid camera time zone offset {}", tz_offset_minutes)))?;

    list.media
        .into_iter()
        .map(|dir| {
            let files = dir
                .items
                .into_iter()
                .map(|item| {
                    let local = DateTime::<Utc>::from_timestamp(item.created, 0).ok_or_else(|| {
                        HerosyncError::Listing(format!(
                            "invalid creation timestamp {} for {}",
                            item.created, item.filename
                        ))
                    })?;
                    let created_at = local.checked_sub_signed(shift).ok_or_else(|| {
                        HerosyncError::Listing(format!(
                            "creation time of {} out of range after time zone correction",
                            item.filename
                        ))
                    })?;
                    Ok(RemoteFile {
                        filename: item.filename,
                        created_at,
                        size: item.size,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(RemoteGroup {
                directory: dir.directory,
                files,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn media_items_accept_strings_and_numbers() {
        let json = r#"{
            "id": "1554375628411872255",
            "media": [{
                "d": "100GOPRO",
                "fs": [
                    {"n": "GH010007.MP4", "cre": "1736932200", "s": "1000"},
                    {"n": "GH020007.MP4", "cre": 1736932800, "s": 2000}
                ]
            }]
        }"#;
        let list: MediaList = serde_json::from_str(json).unwrap();
        let items = &list.media[0].items;
        assert_eq!(items[0].created, 1_736_932_200);
        assert_eq!(items[0].size, 1000);
        assert_eq!(items[1].size, 2000);
    }

    #[test]
    fn rejects_non_numeric_size() {
        let json = r#"{"media": [{"d": "100GOPRO", "fs": [{"n": "GH010007.MP4", "cre": "1", "s": "big"}]}]}"#;
        assert!(serde_json::from_str::<MediaList>(json).is_err());
    }

    #[test]
    fn camera_state_scales_kilobytes() {
        let json = r#"{"status": {"117": 62000000, "54": "31000000", "2": 1}, "settings": {}}"#;
        let state: CameraState = serde_json::from_str(json).unwrap();
        assert_eq!(state.sd_capacity, 62_000_000_000);
        assert_eq!(state.sd_remaining, 31_000_000_000);
    }

    #[test]
    fn shifts_camera_local_time_to_utc() {
        // 2025-01-15 08:00 on a camera set to UTC-8 is 16:00 UTC.
        let camera_local = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap().timestamp();
        let list = MediaList {
            media: vec![MediaDirectory {
                directory: "100GOPRO".into(),
                items: vec![MediaItem {
                    filename: "GH010007.MP4".into(),
                    created: camera_local,
                    size: 1000,
                }],
            }],
        };

        let groups = normalize_media_list(list, -480).unwrap();
        assert_eq!(groups[0].directory, "100GOPRO");
        assert_eq!(
            groups[0].files[0].created_at,
            Utc.with_ymd_and_hms(2025, 1, 15, 16, 0, 0).unwrap()
        );
    }

    fn single_item(created: i64) -> MediaList {
        MediaList {
            media: vec![MediaDirectory {
                directory: "100GOPRO".into(),
                items: vec![MediaItem {
                    filename: "GH010007.MP4".into(),
                    created,
                    size: 1000,
                }],
            }],
        }
    }

    #[test]
    fn absurd_time_zone_is_a_listing_error() {
        let err = normalize_media_list(single_item(1_736_928_000), i64::MAX).unwrap_err();
        assert!(matches!(err, HerosyncError::Listing(_)));
    }

    #[test]
    fn correction_past_the_last_representable_instant_is_a_listing_error() {
        let last = DateTime::<Utc>::MAX_UTC.timestamp();
        let err = normalize_media_list(single_item(last), -60).unwrap_err();
        assert!(matches!(err, HerosyncError::Listing(ref msg) if msg.contains("GH010007.MP4")));
    }

    #[test]
    fn oversized_storage_figures_saturate() {
        let json = r#"{"status": {"117": "18446744073709551615", "54": 1}}"#;
        let state: CameraState = serde_json::from_str(json).unwrap();
        assert_eq!(state.sd_capacity, u64::MAX);
        assert_eq!(state.sd_remaining, 1000);
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        let list: MediaList = serde_json::from_str(r#"{"id": "1", "media": []}"#).unwrap();
        assert!(list.is_empty());
        assert!(normalize_media_list(list, 60).unwrap().is_empty());
    }
}
