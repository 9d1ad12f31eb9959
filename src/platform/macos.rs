/// Root and the sealed system volumes (Data, Preboot, VM, ...) belong to the OS
pub fn is_system_mount(mount_point: &str) -> bool {
    mount_point == "/" || mount_point.starts_with("/System/Volumes/")
}
