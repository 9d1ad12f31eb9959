#[cfg(target_os = "windows")]
pub mod windows;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(target_os = "linux")]
pub mod linux;

pub mod memory;
pub mod native;

pub use memory::MemoryDriveSource;
pub use native::SysinfoDriveSource;

use crate::models::{Drive, Snapshot};
use crate::Result;
use async_trait::async_trait;

/// Source of the host's current drive list.
///
/// Records may be returned in any order; drives hosting the OS should be
/// flagged with `system: true`.
#[async_trait]
pub trait DriveSource: Send + Sync {
    async fn list(&self) -> Result<Vec<Drive>>;
}

/// List the drives reported by `source`, leaving out system drives
pub async fn list_drives(source: &dyn DriveSource) -> Result<Snapshot> {
    let drives = source.list().await?;
    Ok(drives.into_iter().filter(|drive| !drive.system).collect())
}

/// One-shot query of the non-system drives attached to this machine
pub async fn list_host_drives() -> Result<Snapshot> {
    list_drives(&SysinfoDriveSource::new()).await
}

/// Whether `mount_point` hosts the running operating system
pub fn is_system_mount(mount_point: &str) -> bool {
    #[cfg(target_os = "windows")]
    {
        windows::is_system_mount(mount_point)
    }
    #[cfg(target_os = "macos")]
    {
        macos::is_system_mount(mount_point)
    }
    #[cfg(target_os = "linux")]
    {
        linux::is_system_mount(mount_point)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        mount_point == "/"
    }
}
