use super::{CmdResult, MediaPaths};
use crate::device::MediaDevice;
use crate::error::Result;
use crate::inventory::Inventory;

/// All inventory records, narrowed to those matching any of `terms`.
pub fn run<D: MediaDevice + ?Sized, S: AsRef<str>>(device: &D, paths: &MediaPaths, terms: &[S]) -> Result<CmdResult> {
    let inventory = Inventory::load(device, &paths.incoming, &paths.outgoing)?;
    let matched = inventory.filter_by_keyword(terms)?;
    Ok(CmdResult::default().with_listed_files(matched.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::memory::fixtures::{at, DeviceFixture};
    use crate::model::Status;

    fn paths(root: &std::path::Path) -> MediaPaths {
        MediaPaths {
            incoming: root.join("incoming"),
            outgoing: root.join("outgoing"),
        }
    }

    #[test]
    fn lists_everything_without_terms() {
        let temp = tempfile::tempdir().unwrap();
        let device = DeviceFixture::new().with_recording(7, 3, at(0), 1).build();

        let result = run::<_, &str>(&device, &paths(temp.path()), &[]).unwrap();
        assert_eq!(result.listed_files.len(), 3);
        assert!(result.listed_files.iter().all(|f| f.status == Status::OnlyRemote));
    }

    #[test]
    fn terms_narrow_the_listing() {
        let temp = tempfile::tempdir().unwrap();
        let device = DeviceFixture::new()
            .with_recording(7, 2, at(0), 1)
            .with_recording(8, 1, at(60), 1)
            .build();

        let result = run(&device, &paths(temp.path()), &["0008"]).unwrap();
        let names: Vec<_> = result.listed_files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["GH010008.MP4"]);
    }

    #[test]
    fn unmatched_terms_are_no_match() {
        let temp = tempfile::tempdir().unwrap();
        let device = DeviceFixture::new().with_recording(7, 1, at(0), 1).build();

        let err = run(&device, &paths(temp.path()), &["GX99"]).unwrap_err();
        assert!(err.is_no_match());
    }
}
