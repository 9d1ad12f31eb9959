use super::disk::format_drive;
use crate::models::{DriveEvent, ScannerOptions};
use crate::platform::DriveSource;
use crate::services::DriveScanner;
use crate::Result;
use std::sync::Arc;
use tracing::{error, info};

/// Start watching for drives being attached/detached, printing one line per event
pub async fn start_monitoring(
    source: Arc<dyn DriveSource>,
    options: ScannerOptions,
    json: bool,
) -> Result<DriveScanner> {
    info!(
        "Monitoring drives every {:?} ({} known at start)",
        options.interval,
        options.initial_drives.len()
    );
    DriveScanner::spawn(source, options, move |event| match format_event(event, json) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to format {} event: {}", event.name(), e),
    })
    .await
}

/// Stop monitoring and wait for a scan still in flight
pub async fn stop_monitoring(scanner: &DriveScanner) -> Result<()> {
    scanner.shutdown().await?;
    info!("Drive monitoring stopped");
    Ok(())
}

pub fn format_event(event: &DriveEvent, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(event)?);
    }

    let sign = match event {
        DriveEvent::Added(_) => '+',
        DriveEvent::Removed(_) => '-',
    };
    Ok(format!("{} {}", sign, format_drive(event.drive())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Drive;
    use crate::platform::MemoryDriveSource;
    use std::time::Duration;

    #[test]
    fn text_events_are_prefixed_with_sign() {
        let drive = Drive::new("/dev/sdb");
        assert_eq!(format_event(&DriveEvent::Added(drive.clone()), false).unwrap(), "+ /dev/sdb  0 B");
        assert_eq!(format_event(&DriveEvent::Removed(drive), false).unwrap(), "- /dev/sdb  0 B");
    }

    #[test]
    fn json_events_are_tagged() {
        let line = format_event(&DriveEvent::Removed(Drive::new("/dev/sdb")), true).unwrap();
        assert!(line.starts_with(r#"{"event":"drive-removed","drive":{"device":"/dev/sdb""#));
    }

    #[tokio::test(start_paused = true)]
    async fn monitoring_starts_and_stops() {
        let source = Arc::new(MemoryDriveSource::new(vec![Drive::new("/dev/sdb")]));
        let options = ScannerOptions::default().with_interval(Duration::from_millis(50));

        let scanner = start_monitoring(source.clone(), options, true).await.unwrap();
        assert!(scanner.is_running());
        assert_eq!(scanner.drives().await, vec![Drive::new("/dev/sdb")]);

        stop_monitoring(&scanner).await.unwrap();
        assert!(!scanner.is_running());
    }
}
