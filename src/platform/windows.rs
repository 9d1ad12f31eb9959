use crate::utils::first_two_chars;

/// Drive letter of the Windows installation, e.g. "C:"
pub fn system_drive() -> String {
    std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string())
}

/// A mount point such as "C:\" is a system mount when it sits on the system drive letter
pub fn is_system_mount(mount_point: &str) -> bool {
    let system = system_drive();
    first_two_chars(mount_point).eq_ignore_ascii_case(first_two_chars(&system))
}
