//! Drive scanner - polls the drive list on a timer and notifies subscribers of changes
//!
//! Scans are serialized: the held snapshot stays locked from enumeration until
//! every event of that scan has been delivered, so a manual `scan()` racing a
//! timer tick waits its turn and events from two scans never interleave.

use crate::models::{DriveEvent, ScannerOptions, Snapshot};
use crate::platform::{list_drives, DriveSource};
use crate::services::compare::{diff, Comparison};
use crate::utils::events::{EventDispatcher, SubscriptionId};
use crate::{Result, ScannerError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Scanner lifecycle: `Created -> Running -> Stopped`. `Stopped` is terminal.
enum Lifecycle {
    Created,
    /// First scan in progress, timer not armed yet
    Starting,
    Running(TimerHandle),
    Stopped,
}

/// Detects drives being attached and detached.
///
/// ```ignore
/// let scanner = DriveScanner::spawn(
///     Arc::new(SysinfoDriveSource::new()),
///     ScannerOptions::default(),
///     |event| println!("{}: {}", event.name(), event.drive().device),
/// )
/// .await?;
/// // ...
/// scanner.stop()?;
/// ```
///
/// `spawn` registers the handler before the first scan, so drives already
/// attached at startup are reported to it. Use [`DriveScanner::new`] followed
/// by [`DriveScanner::start`] to register several observers first.
pub struct DriveScanner {
    cycle: Arc<ScanCycle>,
    interval: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl DriveScanner {
    /// Create a scanner seeded with `options.initial_drives`. Nothing is polled
    /// until [`DriveScanner::start`].
    pub fn new(source: Arc<dyn DriveSource>, options: ScannerOptions) -> Result<Self> {
        options.validate()?;

        Ok(DriveScanner {
            cycle: Arc::new(ScanCycle {
                source,
                drives: AsyncMutex::new(options.initial_drives),
                events: EventDispatcher::new(),
            }),
            interval: options.interval,
            lifecycle: Mutex::new(Lifecycle::Created),
        })
    }

    /// Create a scanner, register `handler` and start it
    pub async fn spawn<F>(source: Arc<dyn DriveSource>, options: ScannerOptions, handler: F) -> Result<Self>
    where
        F: Fn(&DriveEvent) + Send + Sync + 'static,
    {
        let scanner = Self::new(source, options)?;
        scanner.subscribe(handler);
        scanner.start().await?;
        Ok(scanner)
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.cycle.events
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&DriveEvent) + Send + Sync + 'static,
    {
        self.cycle.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.cycle.events.unsubscribe(id)
    }

    /// Shorthand for `events().channel()`
    pub fn channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<DriveEvent>) {
        self.cycle.events.channel()
    }

    /// Run the first scan right away, then arm the recurring timer.
    ///
    /// A failing first scan is returned to the caller and leaves the scanner
    /// in its created state, so `start` may be retried.
    pub async fn start(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle()?;
            match &*lifecycle {
                Lifecycle::Created => {}
                Lifecycle::Stopped => {
                    return Err(ScannerError::InvalidState(
                        "scanner was stopped; create a new one to resume polling".to_string(),
                    ))
                }
                Lifecycle::Starting | Lifecycle::Running(_) => {
                    return Err(ScannerError::InvalidState("scanner is already started".to_string()))
                }
            }
            *lifecycle = Lifecycle::Starting;
        }

        info!("Starting drive scanner (interval {:?})", self.interval);
        let mut pending = PendingStart { scanner: self, armed: false };

        let events = self.cycle.run().await?;
        debug!("Initial scan produced {} events", events.len());

        let timer = TimerHandle::arm(Arc::clone(&self.cycle), self.interval);
        *self.lifecycle()? = Lifecycle::Running(timer);
        pending.armed = true;
        Ok(())
    }

    /// Poll once: fetch, compare against the held snapshot, store the result
    /// and notify subscribers. Returns the events that were emitted.
    pub async fn scan(&self) -> Result<Vec<DriveEvent>> {
        self.cycle.run().await
    }

    /// Cancel the recurring timer.
    ///
    /// A scan already in flight still completes and emits its events.
    /// Fails with `InvalidState` when no timer is armed.
    pub fn stop(&self) -> Result<()> {
        self.disarm().map(|_| ())
    }

    /// Like [`DriveScanner::stop`], then wait for an in-flight scan to finish
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.disarm()?;
        task.await?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle
            .lock()
            .map(|l| matches!(*l, Lifecycle::Running(_)))
            .unwrap_or(false)
    }

    /// Current held snapshot
    pub async fn drives(&self) -> Snapshot {
        self.cycle.drives.lock().await.clone()
    }

    fn disarm(&self) -> Result<JoinHandle<()>> {
        let mut lifecycle = self.lifecycle()?;
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(timer) => {
                info!("Stopping drive scanner");
                Ok(timer.cancel())
            }
            Lifecycle::Stopped => Err(ScannerError::InvalidState(
                "can't stop scanner: it is already stopped".to_string(),
            )),
            previous => {
                *lifecycle = previous;
                Err(ScannerError::InvalidState(
                    "can't stop scanner: its timer is not armed".to_string(),
                ))
            }
        }
    }

    fn lifecycle(&self) -> Result<MutexGuard<'_, Lifecycle>> {
        self.lifecycle
            .lock()
            .map_err(|e| ScannerError::SystemError(e.to_string()))
    }
}

/// Puts the scanner back to `Created` if `start` fails or is cancelled
/// before the timer gets armed.
struct PendingStart<'a> {
    scanner: &'a DriveScanner,
    armed: bool,
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if self.armed {
            return;
        }
        if let Ok(mut lifecycle) = self.scanner.lifecycle.lock() {
            if matches!(*lifecycle, Lifecycle::Starting) {
                *lifecycle = Lifecycle::Created;
            }
        }
    }
}

// ============================================================
// Scan cycle
// ============================================================

struct ScanCycle {
    source: Arc<dyn DriveSource>,
    drives: AsyncMutex<Snapshot>,
    events: EventDispatcher,
}

impl ScanCycle {
    async fn run(&self) -> Result<Vec<DriveEvent>> {
        let mut held = self.drives.lock().await;

        let current = list_drives(self.source.as_ref()).await?;
        let Comparison { operations, drives } = diff(&held, current);
        *held = drives;

        let events: Vec<DriveEvent> = operations.into_iter().map(DriveEvent::from).collect();
        for event in &events {
            debug!("{}: {}", event.name(), event.drive().device);
            self.events.emit(event);
        }

        Ok(events)
    }
}

// ============================================================
// Timer
// ============================================================

/// Owned recurring timer. Dropping the handle closes the shutdown channel,
/// which also ends the timer task.
struct TimerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    fn arm(cycle: Arc<ScanCycle>, period: Duration) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(run_timer(cycle, period, rx));
        TimerHandle { shutdown, task }
    }

    /// Signal the timer task and hand back its join handle
    fn cancel(self) -> JoinHandle<()> {
        let _ = self.shutdown.send(true);
        self.task
    }
}

async fn run_timer(cycle: Arc<ScanCycle>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    // The first scan already ran in `start`
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = cycle.run().await {
            warn!("Scheduled drive scan failed, retrying next tick: {}", e);
        }
    }

    debug!("Drive scan timer stopped");
}
