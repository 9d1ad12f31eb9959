//! In-memory drive source - the drive list is whatever the owner last set

use super::DriveSource;
use crate::models::Drive;
use crate::{Result, ScannerError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryDriveSource {
    drives: Mutex<Vec<Drive>>,
    failures: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl MemoryDriveSource {
    pub fn new(drives: Vec<Drive>) -> Self {
        MemoryDriveSource {
            drives: Mutex::new(drives),
            ..Default::default()
        }
    }

    /// Replace the reported drive list
    pub fn set_drives(&self, drives: Vec<Drive>) {
        if let Ok(mut current) = self.drives.lock() {
            *current = drives;
        }
    }

    pub fn attach(&self, drive: Drive) {
        if let Ok(mut current) = self.drives.lock() {
            current.push(drive);
        }
    }

    /// Remove every drive structurally equal to `drive`
    pub fn detach(&self, drive: &Drive) {
        if let Ok(mut current) = self.drives.lock() {
            current.retain(|d| d != drive);
        }
    }

    /// Make the next `list` call fail with `message`. Failures queue up.
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(message.into());
        }
    }

    /// Number of `list` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriveSource for MemoryDriveSource {
    async fn list(&self) -> Result<Vec<Drive>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failure = self.failures.lock().ok().and_then(|mut f| f.pop_front());
        if let Some(message) = failure {
            return Err(ScannerError::Enumeration(message));
        }

        self.drives
            .lock()
            .map(|drives| drives.clone())
            .map_err(|e| ScannerError::SystemError(e.to_string()))
    }
}
