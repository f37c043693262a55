//! Decoding of camera-native filenames.
//!
//! GoPro names every file `G<quality><chapter><media id>.<ext>`, e.g.
//! `GH010007.MP4` is chapter 1 of recording 7 in high quality. See
//! <https://gopro.github.io/OpenGoPro/http#tag/Media/Chapters>.
//!
//! Files that don't follow the convention are still tracked by the inventory;
//! they just can't be grouped into recordings.

use once_cell::sync::Lazy;
use regex::Regex;

static GOPRO_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^G(?P<quality>[XHLM])(?P<chapter>\d{2})(?P<media_id>\d{4})\.(?P<ext>MP4|THM|LRV)$")
        .expect("static filename pattern is valid")
});

/// Parsed pieces of a GoPro filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInfo {
    pub quality: char,
    pub chapter: u32,
    pub media_id: u32,
    /// Extension as the camera writes it: `MP4`, `THM` or `LRV`.
    pub extension: String,
}

/// Parses a filename, returning `None` when it isn't a camera-native name.
pub fn parse_filename(filename: &str) -> Option<FilenameInfo> {
    let caps = GOPRO_FILENAME.captures(filename)?;

    Some(FilenameInfo {
        quality: caps["quality"].chars().next()?,
        chapter: caps["chapter"].parse().ok()?,
        media_id: caps["media_id"].parse().ok()?,
        extension: caps["ext"].to_string(),
    })
}
