//! Background sync drainer.
//!
//! Opportunistically flushes the sync queue against the cloud store: on a
//! periodic timer, on an explicit flush nudge (connectivity regained, app
//! foregrounded), and once at startup. Entries are applied strictly in
//! enqueue order per table; a transient failure stops that table's batch so
//! ordering is preserved, and the table retries with exponential backoff on
//! a later trigger. A permanent rejection turns the row into a conflict and
//! leaves the silent-retry path. The drainer never touches row data fields,
//! only `sync_status`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, Notify};

use crate::db::DbPool;
use crate::models::{SyncOp, SyncStatus, SyncQueueEntry, TrackedTable};
use crate::queue;
use crate::remote::RemoteError;
use crate::store::{self, StoreError};

const BATCH_SIZE: i64 = 25;
const BACKOFF_BASE_SECONDS: i64 = 2;
const BACKOFF_CAP_SECONDS: i64 = 300;
const DRAIN_INTERVAL_SECONDS: u64 = 60;

/// The cloud store, as the drainer sees it: one operation applied at a time.
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync {
  async fn apply(&self, entry: &SyncQueueEntry) -> Result<(), RemoteError>;
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct DrainReport {
  pub applied: usize,
  pub conflicts: usize,
  /// Entries left queued behind a transient failure or an active backoff.
  pub deferred: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct BackoffState {
  failures: u32,
  next_attempt: Option<DateTime<Utc>>,
}

pub struct SyncDrainer<R: RemoteStore> {
  db: DbPool,
  remote: R,
  backoff_base_seconds: i64,
  backoff_cap_seconds: i64,
  backoff: StdMutex<HashMap<&'static str, BackoffState>>,
  drain_lock: Mutex<()>,
}

impl<R: RemoteStore> SyncDrainer<R> {
  pub fn new(db: DbPool, remote: R) -> Self {
    Self {
      db,
      remote,
      backoff_base_seconds: BACKOFF_BASE_SECONDS,
      backoff_cap_seconds: BACKOFF_CAP_SECONDS,
      backoff: StdMutex::new(HashMap::new()),
      drain_lock: Mutex::new(()),
    }
  }

  /// Override the retry schedule. Tests use a zero backoff.
  pub fn with_backoff(mut self, base_seconds: i64, cap_seconds: i64) -> Self {
    self.backoff_base_seconds = base_seconds;
    self.backoff_cap_seconds = cap_seconds;
    self
  }

  pub fn remote(&self) -> &R {
    &self.remote
  }

  /// Drain every table with pending entries. Only one drain runs at a time;
  /// a second caller waits here instead of double-applying a batch.
  pub async fn drain_once(&self) -> Result<DrainReport, StoreError> {
    let _guard = self.drain_lock.lock().await;

    let mut report = DrainReport::default();
    for table in queue::pending_tables(&self.db).await? {
      if !self.table_ready(table) {
        report.deferred += queue::depth_for(&self.db, table).await? as usize;
        continue;
      }
      self.drain_table(table, &mut report).await?;
    }

    Ok(report)
  }

  async fn drain_table(&self, table: TrackedTable, report: &mut DrainReport) -> Result<(), StoreError> {
    loop {
      let batch = queue::peek_batch(&self.db, table, BATCH_SIZE).await?;
      if batch.is_empty() {
        return Ok(());
      }

      for entry in &batch {
        match self.remote.apply(entry).await {
          Ok(()) => {
            queue::ack(&self.db, entry.id).await?;
            // The row flips to synced only once nothing else is queued for
            // it; deletes have no row left to mark.
            if entry.op != SyncOp::Delete
              && queue::depth_for_row(&self.db, table, &entry.row_id).await? == 0
            {
              store::mark_sync_status(&self.db, table, &entry.row_id, SyncStatus::Synced).await?;
            }
            self.reset_backoff(table);
            report.applied += 1;
          }
          Err(e) if e.is_permanent() => {
            eprintln!("Sync rejected {}/{}: {}", table.as_str(), entry.row_id, e);
            if entry.op != SyncOp::Delete {
              store::mark_sync_status(&self.db, table, &entry.row_id, SyncStatus::Conflict).await?;
            }
            queue::ack(&self.db, entry.id).await?;
            report.conflicts += 1;
          }
          Err(e) => {
            // Stop this table here: applying later entries first would
            // reorder updates past the one that failed.
            eprintln!("Sync deferred for {}: {}", table.as_str(), e);
            self.record_failure(table);
            report.deferred += queue::depth_for(&self.db, table).await? as usize;
            return Ok(());
          }
        }
      }

      if batch.len() < BATCH_SIZE as usize {
        return Ok(());
      }
    }
  }

  /// Run until the app exits. Entries un-acked at shutdown stay queued and
  /// are retried on the next start.
  pub async fn run(&self, flush: Arc<Notify>) {
    let mut ticker =
      tokio::time::interval(std::time::Duration::from_secs(DRAIN_INTERVAL_SECONDS));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
      tokio::select! {
        _ = ticker.tick() => {}
        _ = flush.notified() => {}
      }

      match self.drain_once().await {
        Ok(report) if report.applied > 0 || report.conflicts > 0 => {
          println!(
            "Sync drain: {} applied, {} conflicts, {} deferred",
            report.applied, report.conflicts, report.deferred
          );
        }
        Ok(_) => {}
        Err(e) => eprintln!("Sync drain failed: {}", e),
      }
    }
  }

  fn table_ready(&self, table: TrackedTable) -> bool {
    let backoff = self.backoff.lock().expect("backoff lock poisoned");
    backoff
      .get(table.as_str())
      .and_then(|s| s.next_attempt)
      .is_none_or(|t| Utc::now() >= t)
  }

  fn record_failure(&self, table: TrackedTable) {
    let mut backoff = self.backoff.lock().expect("backoff lock poisoned");
    let state = backoff.entry(table.as_str()).or_default();
    state.failures += 1;
    let exponent = state.failures.saturating_sub(1).min(16);
    let delay = (self.backoff_base_seconds << exponent).min(self.backoff_cap_seconds);
    state.next_attempt = Some(Utc::now() + Duration::seconds(delay));
  }

  fn reset_backoff(&self, table: TrackedTable) {
    let mut backoff = self.backoff.lock().expect("backoff lock poisoned");
    backoff.remove(table.as_str());
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
