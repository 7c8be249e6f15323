use crate::announcements::{self, AnnouncementSyncResult};
use crate::db::AppState;
use crate::drainer::DrainReport;
use crate::models::TrackedTable;
use crate::queue;
use crate::remote::RemoteError;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Sync Status
/// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct SyncOverview {
  pub queue_depth: i64,
  pub tables: Vec<TableSyncStatus>,
}

#[derive(Serialize)]
pub struct TableSyncStatus {
  pub table: String,
  pub pending: i64,
  pub synced: i64,
  pub conflict: i64,
}

/// Queue depth plus per-table row status counts, for the "pending sync"
/// indicator and the conflict screen.
#[tauri::command]
pub async fn get_sync_overview(
  state: State<'_, Arc<AppState>>,
) -> Result<SyncOverview, String> {
  let queue_depth = queue::depth(&state.db)
    .await
    .map_err(|e| e.to_string())?;

  let mut tables = Vec::new();
  for table in TrackedTable::ALL {
    let counts: Vec<(String, i64)> = sqlx::query_as(&format!(
      "SELECT sync_status, COUNT(*) FROM {} GROUP BY sync_status",
      table.as_str()
    ))
    .fetch_all(&state.db)
    .await
    .map_err(|e| format!("Failed to count {}: {}", table.as_str(), e))?;

    let mut status = TableSyncStatus {
      table: table.as_str().to_string(),
      pending: 0,
      synced: 0,
      conflict: 0,
    };
    for (name, count) in counts {
      match name.as_str() {
        "pending" => status.pending = count,
        "synced" => status.synced = count,
        "conflict" => status.conflict = count,
        _ => {}
      }
    }
    tables.push(status);
  }

  Ok(SyncOverview { queue_depth, tables })
}

/// ---------------------------------------------------------------------------
/// Drain Triggers
/// ---------------------------------------------------------------------------

/// Drain the queue now and report what happened.
#[tauri::command]
pub async fn flush_sync_queue(state: State<'_, Arc<AppState>>) -> Result<DrainReport, String> {
  match &state.drainer {
    Some(drainer) => drainer.drain_once().await.map_err(|e| e.to_string()),
    None => Err("Cloud sync is not configured".to_string()),
  }
}

/// Fire-and-forget nudge from the frontend when connectivity comes back.
#[tauri::command]
pub fn notify_online(state: State<'_, Arc<AppState>>) {
  state.flush.notify_one();
}

/// ---------------------------------------------------------------------------
/// Conflict Resolution
/// ---------------------------------------------------------------------------

/// Put a conflicted row back on the sync path after the user resolved it.
#[tauri::command]
pub async fn retry_conflict(
  state: State<'_, Arc<AppState>>,
  table: String,
  row_id: String,
) -> Result<(), String> {
  let table: TrackedTable = table.parse()?;
  state
    .store()
    .retry_conflict(table, &row_id)
    .await
    .map_err(|e| e.to_string())
}

/// ---------------------------------------------------------------------------
/// Announcements
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn sync_announcements(
  state: State<'_, Arc<AppState>>,
) -> Result<AnnouncementSyncResult, RemoteError> {
  match &state.drainer {
    Some(drainer) => announcements::sync_announcements(&state.db, drainer.remote()).await,
    None => Err(RemoteError::MissingConfig(
      "IRONLOG_API_BASE_URL".to_string(),
    )),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{SyncStatus, TrackedTable, WorkoutLog};
  use crate::test_utils::*;
  use serial_test::serial;
  use tauri::Manager;

  fn unconfigured_state(pool: sqlx::SqlitePool) -> Arc<AppState> {
    let mut state = AppState::new(pool);
    state.drainer = None;
    Arc::new(state)
  }

  #[tokio::test]
  #[serial]
  async fn test_sync_overview_counts_by_status() {
    let pool = setup_test_db().await;
    let store = crate::store::LocalStore::new(pool.clone());

    let log = WorkoutLog::new("user-1", None, date_days_ago(0), datetime_days_ago(0));
    store.put_workout_log(&log).await.unwrap();
    crate::store::mark_sync_status(
      &pool,
      TrackedTable::WorkoutLogs,
      &log.id,
      SyncStatus::Conflict,
    )
    .await
    .unwrap();

    let app = tauri::test::mock_app();
    app.manage(unconfigured_state(pool.clone()));

    let overview = get_sync_overview(app.state()).await.expect("Should report");
    assert_eq!(overview.queue_depth, 1);
    let logs = overview
      .tables
      .iter()
      .find(|t| t.table == "workout_logs")
      .unwrap();
    assert_eq!(logs.conflict, 1);
    assert_eq!(logs.pending, 0);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_flush_without_configuration_fails_cleanly() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(unconfigured_state(pool.clone()));

    let result = flush_sync_queue(app.state()).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("not configured"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_retry_conflict_rejects_unknown_table() {
    let pool = setup_test_db().await;
    let app = tauri::test::mock_app();
    app.manage(unconfigured_state(pool.clone()));

    let result = retry_conflict(
      app.state(),
      "no_such_table".to_string(),
      "row-1".to_string(),
    )
    .await;
    assert!(result.is_err());

    teardown_test_db(pool).await;
  }
}
