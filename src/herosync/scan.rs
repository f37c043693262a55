//! Listing of the local staging directories.

use crate::error::{HerosyncError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Size and modification time of a file in a local directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFile {
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Filename to file facts, ordered by filename.
pub type LocalListing = BTreeMap<String, LocalFile>;

/// Lists the regular files directly inside `dir`.
///
/// A missing directory yields an empty listing. Any other I/O failure is
/// returned as [`HerosyncError::Scan`], since a partial listing would make
/// later delete decisions unsound.
pub fn scan_dir(dir: &Path) -> Result<LocalListing> {
    let scan_err = |source| HerosyncError::Scan {
        dir: dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LocalListing::new()),
        Err(e) => return Err(scan_err(e)),
    };

    let mut files = LocalListing::new();
    for entry in entries {
        let entry = entry.map_err(scan_err)?;
        let file_type = entry.file_type().map_err(scan_err)?;
        if !file_type.is_file() {
            continue;
        }

        let metadata = entry.metadata().map_err(scan_err)?;
        let modified = metadata.modified().map_err(scan_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();

        files.insert(
            name,
            LocalFile {
                size: metadata.len(),
                modified: DateTime::<Utc>::from(modified),
            },
        );
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;

    #[test]
    fn missing_directory_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let listing = scan_dir(&temp.path().join("not-created-yet")).unwrap();
        assert!(listing.is_empty());
    }

    #[test]
    fn lists_regular_files_with_size_and_mtime() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("GH010007.MP4");
        fs::write(&path, vec![0u8; 1000]).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_736_932_200, 0)).unwrap();

        let listing = scan_dir(temp.path()).unwrap();
        let file = listing.get("GH010007.MP4").unwrap();
        assert_eq!(file.size, 1000);
        assert_eq!(file.modified.timestamp(), 1_736_932_200);
    }

    #[test]
    fn skips_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("GH010001.MP4"), b"x").unwrap();
        fs::write(temp.path().join("notes.txt"), b"hello").unwrap();

        let listing = scan_dir(temp.path()).unwrap();
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["notes.txt"]);
    }

    #[test]
    fn a_file_in_place_of_the_directory_is_a_scan_failure() {
        let temp = tempfile::tempdir().unwrap();
        let not_a_dir = temp.path().join("incoming");
        fs::write(&not_a_dir, b"oops").unwrap();

        let err = scan_dir(&not_a_dir).unwrap_err();
        assert!(matches!(err, HerosyncError::Scan { .. }));
    }
}
