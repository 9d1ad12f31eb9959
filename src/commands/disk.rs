use crate::models::Drive;
use crate::platform::{list_drives, DriveSource};
use crate::utils::format_size;
use crate::{Result, ScannerError};

/// List drives, optionally including the ones hosting the OS
pub async fn list_disks(source: &dyn DriveSource, include_system: bool) -> Result<Vec<Drive>> {
    if include_system {
        source.list().await
    } else {
        list_drives(source).await
    }
}

/// Look up a single drive by device name or by one of its mount points
pub async fn get_disk_info(source: &dyn DriveSource, device: &str) -> Result<Drive> {
    source
        .list()
        .await?
        .into_iter()
        .find(|d| d.device == device || d.mountpoints.iter().any(|m| m == device))
        .ok_or_else(|| ScannerError::DeviceNotFound(device.to_string()))
}

/// One line summary, e.g. `/dev/sdb  14.9 GB  USB stick [/media/usb] (removable)`
pub fn format_drive(drive: &Drive) -> String {
    let mut line = format!("{}  {}", drive.device, format_size(drive.size));
    if !drive.description.is_empty() {
        line.push_str("  ");
        line.push_str(&drive.description);
    }
    if !drive.mountpoints.is_empty() {
        line.push_str(&format!(" [{}]", drive.mountpoints.join(", ")));
    }
    if drive.removable {
        line.push_str(" (removable)");
    }
    if drive.system {
        line.push_str(" (system)");
    }
    line
}
