//! Write-through persistence to the primary store plus a debounced backup
//! snapshot written to a dated file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::db::{store_lists, DbPool};
use crate::error::AppError;
use crate::models::Todo;
use crate::session::ChangeListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub active: Vec<Todo>,
    pub done: Vec<Todo>,
}

impl Snapshot {
    /// Active items followed by done items.
    pub fn all(&self) -> Vec<&Todo> {
        self.active.iter().chain(self.done.iter()).collect()
    }
}

/// Coalescing state for the backup writer.
///
/// Every event replaces the pending value and pushes the deadline out by a
/// full window, so a value is only released after a quiet period.
#[derive(Debug)]
pub enum Debounce<T> {
    Idle,
    Armed { latest: T, deadline: Instant },
}

impl<T> Debounce<T> {
    pub fn push(&mut self, value: T, now: Instant, window: Duration) {
        *self = Debounce::Armed {
            latest: value,
            deadline: now + window,
        };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Debounce::Idle => None,
            Debounce::Armed { deadline, .. } => Some(*deadline),
        }
    }

    /// Releases the pending value once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.take(),
            _ => None,
        }
    }

    pub fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, Debounce::Idle) {
            Debounce::Idle => None,
            Debounce::Armed { latest, .. } => Some(latest),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, Debounce::Armed { .. })
    }
}

#[async_trait]
pub trait BackupSink: Send + Sync {
    async fn write(&self, snapshot: &Snapshot) -> Result<(), AppError>;
}

/// Writes the full state as a pretty-printed JSON array to
/// `backup_{Y-M-D}.txt`, one file per calendar day.
pub struct FileBackup {
    dir: PathBuf,
}

impl FileBackup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBackup { dir: dir.into() }
    }

    pub fn path_for(&self, date: Date) -> PathBuf {
        self.dir.join(backup_file_name(date))
    }

    /// Writes the file for `date` and returns its path.
    pub async fn write_dated(&self, snapshot: &Snapshot, date: Date) -> Result<PathBuf, AppError> {
        let path = self.path_for(date);
        let contents = serde_json::to_string_pretty(&snapshot.all())?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, contents).await?;
        info!(path = %path.display(), "stored backup");
        Ok(path)
    }
}

#[async_trait]
impl BackupSink for FileBackup {
    async fn write(&self, snapshot: &Snapshot) -> Result<(), AppError> {
        self.write_dated(snapshot, today()).await?;
        Ok(())
    }
}

pub fn backup_file_name(date: Date) -> String {
    format!(
        "backup_{}-{}-{}.txt",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Listener that persists every change. Primary store writes happen inline;
/// backups are handed to the coalescing task.
pub struct PersistencePipeline {
    db: DbPool,
    backup_tx: mpsc::UnboundedSender<Snapshot>,
}

pub struct BackupTask {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PersistencePipeline {
    /// Starts the backup loop on the current runtime.
    pub fn spawn(
        db: DbPool,
        sink: Arc<dyn BackupSink>,
        window: Duration,
    ) -> (PersistencePipeline, BackupTask) {
        let (backup_tx, backup_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_backups(backup_rx, shutdown_rx, sink, window));

        (
            PersistencePipeline { db, backup_tx },
            BackupTask {
                shutdown_tx,
                handle,
            },
        )
    }

    /// Writes through to the primary store and queues a backup. The backup
    /// is queued even when the primary write fails.
    pub fn publish(&self, active: &[Todo], done: &[Todo]) -> Result<(), AppError> {
        let stored = store_lists(&self.db, active, done);

        let snapshot = Snapshot {
            active: active.to_vec(),
            done: done.to_vec(),
        };
        if self.backup_tx.send(snapshot).is_err() {
            warn!("backup task is gone, skipping backup");
        }
        stored
    }
}

impl ChangeListener for PersistencePipeline {
    fn todos_changed(&self, active: &[Todo], done: &[Todo]) -> Result<(), AppError> {
        self.publish(active, done)
    }
}

impl BackupTask {
    /// Stops the backup loop. A snapshot still waiting for its quiet period
    /// is dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.handle.await {
            warn!(error = %err, "backup task ended abnormally");
        }
    }
}

async fn run_backups(
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    mut shutdown_rx: oneshot::Receiver<()>,
    sink: Arc<dyn BackupSink>,
    window: Duration,
) {
    let mut state = Debounce::Idle;

    loop {
        let deadline = state.deadline();
        tokio::select! {
            _ = &mut shutdown_rx => break,
            event = rx.recv() => match event {
                Some(snapshot) => {
                    debug!(window_ms = window.as_millis() as u64, "backup armed");
                    state.push(snapshot, Instant::now(), window);
                }
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(snapshot) = state.take_due(Instant::now()) {
                    // Awaited here so the next write cannot start before this one ends.
                    if let Err(err) = sink.write(&snapshot).await {
                        warn!(error = %err, "backup failed");
                    }
                }
            }
        }
    }

    if state.is_armed() {
        debug!("abandoning pending backup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn backup_names_are_not_zero_padded() {
        let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
        assert_eq!(backup_file_name(date), "backup_2024-3-7.txt");

        let date = Date::from_calendar_date(2025, Month::December, 31).unwrap();
        assert_eq!(backup_file_name(date), "backup_2025-12-31.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_releases_latest_after_quiet_period() {
        let window = Duration::from_secs(2);
        let start = Instant::now();
        let mut state = Debounce::Idle;

        state.push(1, start, window);
        state.push(2, start + Duration::from_millis(500), window);
        assert_eq!(state.take_due(start + Duration::from_secs(2)), None);
        assert_eq!(
            state.deadline(),
            Some(start + Duration::from_millis(2500))
        );
        assert_eq!(state.take_due(start + Duration::from_millis(2500)), Some(2));
        assert!(!state.is_armed());
        assert_eq!(state.take_due(start + Duration::from_secs(10)), None);
    }

    #[tokio::test]
    async fn file_backup_writes_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let backup = FileBackup::new(dir.path().join("support"));
        let mut done = Todo::from(crate::models::StoredTodo::default());
        done.is_completed = true;
        let active = Todo::from(crate::models::StoredTodo::default());
        let snapshot = Snapshot {
            active: vec![active.clone()],
            done: vec![done.clone()],
        };

        let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
        let path = backup.write_dated(&snapshot, date).await.unwrap();
        assert_eq!(path, dir.path().join("support").join("backup_2024-3-7.txt"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[\n  {"));
        let parsed: Vec<Todo> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, vec![active, done]);
    }

    #[tokio::test]
    async fn same_day_backups_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let backup = FileBackup::new(dir.path());
        let date = Date::from_calendar_date(2024, Month::March, 7).unwrap();
        let first = Snapshot {
            active: vec![Todo::from(crate::models::StoredTodo::default())],
            done: Vec::new(),
        };

        backup.write_dated(&first, date).await.unwrap();
        let path = backup
            .write_dated(
                &Snapshot {
                    active: Vec::new(),
                    done: Vec::new(),
                },
                date,
            )
            .await
            .unwrap();

        let parsed: Vec<Todo> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
