use super::{CmdResult, MediaPaths};
use crate::device::{CameraState, HardwareInfo, MediaDevice};
use crate::error::Result;
use crate::inventory::Inventory;
use crate::model::Status;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub base_url: String,
    pub hardware: HardwareInfo,
    pub storage: CameraState,
    /// File count per status, in [`Status::ALL`] order.
    pub counts: Vec<(Status, usize)>,
    pub total_files: usize,
    pub total_bytes: u64,
}

pub fn run<D: MediaDevice + ?Sized>(device: &D, paths: &MediaPaths) -> Result<CmdResult> {
    let hardware = device.hardware_info()?;
    let storage = device.camera_state()?;
    let inventory = Inventory::load(device, &paths.incoming, &paths.outgoing)?;

    let counts = Status::ALL
        .iter()
        .map(|status| (*status, inventory.count_by_status(*status)))
        .collect();

    Ok(CmdResult::default().with_status(StatusReport {
        base_url: device.base_url(),
        hardware,
        storage,
        counts,
        total_files: inventory.len(),
        total_bytes: inventory.total_size(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::memory::fixtures::{at, DeviceFixture};
    use std::fs;

    #[test]
    fn reports_device_and_counts() {
        let temp = tempfile::tempdir().unwrap();
        let paths = MediaPaths {
            incoming: temp.path().join("incoming"),
            outgoing: temp.path().join("outgoing"),
        };
        fs::create_dir_all(&paths.incoming).unwrap();
        fs::write(paths.incoming.join("GH010007.MP4"), vec![0u8; 10]).unwrap();

        let mut device = DeviceFixture::new().with_recording(7, 2, at(0), 10).build();
        device.set_hardware_info(HardwareInfo {
            model_name: "HERO12 Black".into(),
            serial_number: "C3501324500000".into(),
            firmware_version: "H23.01.01.10.00".into(),
        });
        device.set_camera_state(CameraState {
            sd_capacity: 64_000_000_000,
            sd_remaining: 32_000_000_000,
        });

        let result = run(&device, &paths).unwrap();
        let report = result.status.unwrap();
        assert_eq!(report.hardware.model_name, "HERO12 Black");
        assert_eq!(report.storage.sd_remaining, 32_000_000_000);
        assert_eq!(report.total_files, 2);
        assert_eq!(report.total_bytes, 20);

        let count = |status| report.counts.iter().find(|(s, _)| *s == status).unwrap().1;
        assert_eq!(count(Status::InSync), 1);
        assert_eq!(count(Status::OnlyRemote), 1);
        assert_eq!(count(Status::Processed), 0);
    }
}
