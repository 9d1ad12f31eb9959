use async_trait::async_trait;
use drive_scanner::platform::MemoryDriveSource;
use drive_scanner::{diff, list_drives, Drive, DriveEvent, DriveScanner, DriveSource, Operation, ScannerOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_test::assert_ok;

const INTERVAL: Duration = Duration::from_millis(100);

fn drive(device: &str) -> Drive {
    Drive {
        description: format!("{} flash drive", device),
        size: 32 * 1024 * 1024 * 1024,
        mountpoints: vec![format!("/run/media{}", device)],
        kind: "SSD".into(),
        file_system: "exfat".into(),
        removable: true,
        ..Drive::new(device)
    }
}

fn system_drive(device: &str) -> Drive {
    Drive {
        system: true,
        mountpoints: vec!["/".into()],
        ..drive(device)
    }
}

fn options() -> ScannerOptions {
    ScannerOptions::default().with_interval(INTERVAL)
}

#[test]
fn empty_to_one_drive_adds_it() {
    let comparison = diff(&[], vec![drive("/dev/sda")]);
    assert_eq!(comparison.operations, vec![Operation::Add(drive("/dev/sda"))]);
    assert_eq!(comparison.drives, vec![drive("/dev/sda")]);
}

#[test]
fn dropping_a_drive_removes_it() {
    let comparison = diff(&[drive("/dev/sda"), drive("/dev/sdb")], vec![drive("/dev/sdb")]);
    assert_eq!(comparison.operations, vec![Operation::Remove(drive("/dev/sda"))]);
    assert_eq!(comparison.drives, vec![drive("/dev/sdb")]);
}

#[tokio::test]
async fn system_drive_never_reaches_the_comparison() {
    let source = MemoryDriveSource::new(vec![drive("/dev/sda"), system_drive("/dev/sdc")]);

    let current = assert_ok!(list_drives(&source).await);
    let comparison = diff(&[drive("/dev/sda")], current);
    assert!(comparison.operations.is_empty());
    assert_eq!(comparison.drives, vec![drive("/dev/sda")]);
}

#[tokio::test(start_paused = true)]
async fn first_scan_reports_only_new_drives() {
    let source = Arc::new(MemoryDriveSource::new(vec![drive("/dev/sdx"), drive("/dev/sdy")]));
    let scanner = assert_ok!(DriveScanner::new(
        source.clone(),
        options().with_initial_drives(vec![drive("/dev/sdx")]),
    ));
    let (_, mut rx) = scanner.channel();

    assert_ok!(scanner.start().await);

    assert_eq!(rx.try_recv().unwrap(), DriveEvent::Added(drive("/dev/sdy")));
    assert!(rx.try_recv().is_err());
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn timer_reports_attach_and_detach() {
    let source = Arc::new(MemoryDriveSource::default());
    let scanner = assert_ok!(DriveScanner::new(source.clone(), options()));
    let (_, mut rx) = scanner.channel();
    assert_ok!(scanner.start().await);
    assert!(rx.try_recv().is_err());

    let started = tokio::time::Instant::now();
    source.attach(drive("/dev/sdb"));
    assert_eq!(rx.recv().await.unwrap(), DriveEvent::Added(drive("/dev/sdb")));
    assert!(started.elapsed() >= INTERVAL);

    source.detach(&drive("/dev/sdb"));
    assert_eq!(rx.recv().await.unwrap(), DriveEvent::Removed(drive("/dev/sdb")));
    assert!(scanner.drives().await.is_empty());

    assert_ok!(scanner.stop());
}

#[tokio::test(start_paused = true)]
async fn handlers_see_events_in_operation_order() {
    let source = Arc::new(MemoryDriveSource::new(vec![drive("/dev/sdb"), drive("/dev/sdc")]));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let scanner = assert_ok!(
        DriveScanner::spawn(source.clone(), options(), move |event| {
            sink.lock().unwrap().push(format!("{} {}", event.name(), event.drive().device));
        })
        .await
    );

    source.set_drives(vec![drive("/dev/sdc"), drive("/dev/sdd")]);
    let events = assert_ok!(scanner.scan().await);
    assert_eq!(events.len(), 2);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "drive-added /dev/sdb".to_string(),
            "drive-added /dev/sdc".to_string(),
            "drive-added /dev/sdd".to_string(),
            "drive-removed /dev/sdb".to_string(),
        ]
    );
    assert_ok!(scanner.stop());
}

#[tokio::test(start_paused = true)]
async fn failed_scheduled_scan_is_retried() {
    let source = Arc::new(MemoryDriveSource::default());
    let scanner = assert_ok!(DriveScanner::new(source.clone(), options()));
    let (_, mut rx) = scanner.channel();
    assert_ok!(scanner.start().await);

    source.fail_next("usb bus reset");
    source.attach(drive("/dev/sdb"));

    assert_eq!(rx.recv().await.unwrap(), DriveEvent::Added(drive("/dev/sdb")));
    assert!(source.calls() >= 3);
    assert!(scanner.is_running());
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_handler_misses_later_events() {
    let source = Arc::new(MemoryDriveSource::default());
    let scanner = assert_ok!(DriveScanner::new(source.clone(), options()));
    let (id, mut rx) = scanner.channel();
    assert_ok!(scanner.start().await);

    assert!(scanner.unsubscribe(id));
    source.attach(drive("/dev/sdb"));
    assert_eq!(assert_ok!(scanner.scan().await).len(), 1);
    assert!(rx.try_recv().is_err());
}

/// Blocks every `list` call until a permit is released
struct GatedSource {
    inner: MemoryDriveSource,
    gate: Semaphore,
    entered: AtomicUsize,
}

impl GatedSource {
    fn new(drives: Vec<Drive>, permits: usize) -> Self {
        GatedSource {
            inner: MemoryDriveSource::new(drives),
            gate: Semaphore::new(permits),
            entered: AtomicUsize::new(0),
        }
    }

    fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl DriveSource for GatedSource {
    async fn list(&self) -> drive_scanner::Result<Vec<Drive>> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| drive_scanner::ScannerError::SystemError(e.to_string()))?;
        permit.forget();
        self.inner.list().await
    }
}

#[tokio::test(start_paused = true)]
async fn stop_lets_an_in_flight_scan_finish() {
    let source = Arc::new(GatedSource::new(Vec::new(), 1));
    let scanner = assert_ok!(DriveScanner::new(source.clone(), options()));
    let (_, mut rx) = scanner.channel();
    assert_ok!(scanner.start().await);

    source.inner.attach(drive("/dev/sdb"));
    tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
    assert_eq!(source.entered(), 2);

    assert_ok!(scanner.stop());
    source.gate.add_permits(1);

    assert_eq!(rx.recv().await.unwrap(), DriveEvent::Added(drive("/dev/sdb")));
    assert_eq!(scanner.drives().await, vec![drive("/dev/sdb")]);

    source.gate.add_permits(10);
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(source.entered(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_scans_are_serialized() {
    let source = Arc::new(GatedSource::new(vec![drive("/dev/sdb")], 0));
    let scanner = Arc::new(assert_ok!(DriveScanner::new(source.clone(), options())));
    let (_, mut rx) = scanner.channel();

    let first = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan().await }
    });
    settle().await;
    assert_eq!(source.entered(), 1);

    let second = tokio::spawn({
        let scanner = Arc::clone(&scanner);
        async move { scanner.scan().await }
    });
    settle().await;
    // The second scan queues on the held snapshot, not inside the source
    assert_eq!(source.entered(), 1);

    source.gate.add_permits(1);
    settle().await;
    assert_eq!(source.entered(), 2);
    assert_eq!(rx.try_recv().unwrap(), DriveEvent::Added(drive("/dev/sdb")));

    source.gate.add_permits(1);
    let first = assert_ok!(first.await.unwrap());
    let second = assert_ok!(second.await.unwrap());

    assert_eq!(first.len() + second.len(), 1);
    assert!(rx.try_recv().is_err());
    assert_eq!(scanner.drives().await, vec![drive("/dev/sdb")]);
}
