//! Drive list scanner: polls the host's storage drives and reports drives
//! being attached (`drive-added`) or detached (`drive-removed`).

pub mod commands;
pub mod error;
pub mod models;
pub mod platform;
pub mod services;
pub mod utils;

pub use error::{Result, ScannerError};
pub use models::{Drive, DriveEvent, Operation, ScannerOptions, Snapshot};
pub use platform::{list_drives, DriveSource};
pub use services::{diff, Comparison, DriveScanner};
