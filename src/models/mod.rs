use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

use crate::{Result, ScannerError};

/// Poll interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Notification name for a newly attached drive
pub const DRIVE_ADDED: &str = "drive-added";
/// Notification name for a detached drive
pub const DRIVE_REMOVED: &str = "drive-removed";

// ============================================================
// Data Structures
// ============================================================

/// One storage device as reported by the OS.
///
/// Equality is structural over every field: enumeration backends do not
/// guarantee a stable identifier between polls, so two records describe the
/// same drive only when all of their fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub device: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mountpoints: Vec<String>,
    /// Media kind, e.g. "SSD", "HDD"
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub file_system: String,
    #[serde(default)]
    pub removable: bool,
    /// Set for the drive(s) hosting the running OS
    #[serde(default)]
    pub system: bool,
}

impl Drive {
    pub fn new(device: impl Into<String>) -> Self {
        Drive {
            device: device.into(),
            ..Default::default()
        }
    }
}

/// Full set of drives observed in a single poll.
pub type Snapshot = Vec<Drive>;

/// A change detected between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "drive", rename_all = "lowercase")]
pub enum Operation {
    Add(Drive),
    Remove(Drive),
}

impl Operation {
    pub fn drive(&self) -> &Drive {
        match self {
            Operation::Add(drive) | Operation::Remove(drive) => drive,
        }
    }
}

/// Notification delivered to scanner subscribers, one per change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "drive")]
pub enum DriveEvent {
    #[serde(rename = "drive-added")]
    Added(Drive),
    #[serde(rename = "drive-removed")]
    Removed(Drive),
}

impl DriveEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DriveEvent::Added(_) => DRIVE_ADDED,
            DriveEvent::Removed(_) => DRIVE_REMOVED,
        }
    }

    pub fn drive(&self) -> &Drive {
        match self {
            DriveEvent::Added(drive) | DriveEvent::Removed(drive) => drive,
        }
    }
}

impl From<Operation> for DriveEvent {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Add(drive) => DriveEvent::Added(drive),
            Operation::Remove(drive) => DriveEvent::Removed(drive),
        }
    }
}

// ============================================================
// Configuration
// ============================================================

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerOptions {
    /// Check interval, written as milliseconds in JSON
    #[serde(with = "duration_ms")]
    pub interval: Duration,
    /// Drives assumed present before the first scan
    #[serde(alias = "drives")]
    pub initial_drives: Snapshot,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        ScannerOptions {
            interval: DEFAULT_INTERVAL,
            initial_drives: Vec::new(),
        }
    }
}

impl ScannerOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_initial_drives(mut self, drives: Snapshot) -> Self {
        self.initial_drives = drives;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ScannerError::InvalidParameter(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: ScannerOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

mod duration_ms {
    use super::*;
    use serde::ser::Error;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom(format!("interval {:?} does not fit in u64 milliseconds", value)))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
