pub mod events;
pub mod log;

use sysinfo::System;

/// Safely extract the first two characters of a string (e.g. "E:" from "E:\\").
/// Returns the full string if it's shorter than 2 characters.
pub fn first_two_chars(s: &str) -> &str {
    if s.len() < 2 {
        s
    } else {
        &s[..s.char_indices().nth(2).map(|(i, _)| i).unwrap_or(s.len())]
    }
}

pub fn get_os_version() -> String {
    System::long_os_version().unwrap_or_else(|| "Unknown".to_string())
}

/// Human readable size with binary units, e.g. "14.9 GB"
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
