/// Mount points that belong to the running system on Linux
const SYSTEM_MOUNTS: &[&str] = &["/", "/boot", "/boot/efi", "/efi", "/usr"];

pub fn is_system_mount(mount_point: &str) -> bool {
    let trimmed = match mount_point.trim_end_matches('/') {
        "" => "/",
        other => other,
    };
    SYSTEM_MOUNTS.contains(&trimmed)
}
