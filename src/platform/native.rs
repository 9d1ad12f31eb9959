//! Native drive enumeration backed by `sysinfo`

use super::{is_system_mount, DriveSource};
use crate::models::Drive;
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use sysinfo::{Disk, DiskKind, Disks};
use tracing::debug;

/// How mounted volumes are folded into drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// One drive per device node; `name` is a `/dev/...` path
    Device,
    /// One drive per mount point; `name` is only a volume label
    MountPoint,
}

/// sysinfo reports the device node as the name on Linux but the volume label
/// on macOS and Windows, where labels are neither unique nor stable.
#[cfg(target_os = "linux")]
pub const GROUP_BY: GroupBy = GroupBy::Device;
#[cfg(not(target_os = "linux"))]
pub const GROUP_BY: GroupBy = GroupBy::MountPoint;

/// Lists the host's mounted drives.
///
/// On Linux a device mounted at several places yields a single `Drive` with
/// all of its mount points. Available space is not recorded since it changes
/// between polls.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoDriveSource;

impl SysinfoDriveSource {
    pub fn new() -> Self {
        SysinfoDriveSource
    }
}

#[async_trait]
impl DriveSource for SysinfoDriveSource {
    async fn list(&self) -> Result<Vec<Drive>> {
        // sysinfo refreshes synchronously
        let drives = tokio::task::spawn_blocking(collect_drives).await?;
        debug!("Enumerated {} drives", drives.len());
        Ok(drives)
    }
}

/// One mounted volume as reported by sysinfo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Device node on Linux, volume label elsewhere
    pub name: String,
    pub mount_point: String,
    pub kind: &'static str,
    pub file_system: String,
    pub total_space: u64,
    pub removable: bool,
}

impl From<&Disk> for Volume {
    fn from(disk: &Disk) -> Self {
        Volume {
            name: disk.name().to_string_lossy().to_string(),
            mount_point: disk.mount_point().to_string_lossy().to_string(),
            kind: kind_label(disk.kind()),
            file_system: disk.file_system().to_string_lossy().to_string(),
            total_space: disk.total_space(),
            removable: disk.is_removable(),
        }
    }
}

fn collect_drives() -> Vec<Drive> {
    let disks = Disks::new_with_refreshed_list();
    group_volumes(disks.list().iter().map(Volume::from), GROUP_BY)
}

/// Fold volumes into drives, ordered by device
pub fn group_volumes(volumes: impl IntoIterator<Item = Volume>, group_by: GroupBy) -> Vec<Drive> {
    let mut grouped: BTreeMap<String, Drive> = BTreeMap::new();

    for volume in volumes {
        let device = match group_by {
            GroupBy::Device if !volume.name.is_empty() => volume.name.clone(),
            _ => volume.mount_point.clone(),
        };

        let drive = grouped
            .entry(device.clone())
            .or_insert_with(|| drive_from_volume(device, &volume, group_by));
        drive.system |= is_system_mount(&volume.mount_point);
        drive.mountpoints.push(volume.mount_point);
    }

    grouped
        .into_values()
        .map(|mut drive| {
            drive.mountpoints.sort();
            drive
        })
        .collect()
}

fn drive_from_volume(device: String, volume: &Volume, group_by: GroupBy) -> Drive {
    let label = match group_by {
        GroupBy::MountPoint => volume.name.as_str(),
        GroupBy::Device => "",
    };

    Drive {
        device,
        description: describe(label, volume.kind, &volume.file_system, volume.total_space),
        size: volume.total_space,
        mountpoints: Vec::new(),
        kind: volume.kind.to_string(),
        file_system: volume.file_system.clone(),
        removable: volume.removable,
        system: false,
    }
}

fn kind_label(kind: DiskKind) -> &'static str {
    match kind {
        DiskKind::HDD => "HDD",
        DiskKind::SSD => "SSD",
        DiskKind::Unknown(_) => "Unknown",
    }
}

fn describe(label: &str, kind: &str, file_system: &str, size: u64) -> String {
    let mut description = String::new();
    if !label.is_empty() {
        description.push_str(label);
        description.push(' ');
    }
    description.push_str(&format!("{} {}", crate::utils::format_size(size), kind));
    if !file_system.is_empty() {
        description.push_str(&format!(" ({})", file_system));
    }
    description
}
