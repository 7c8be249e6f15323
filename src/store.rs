//! Local-first store.
//!
//! Every put/delete on a sync-tracked table writes the row and appends the
//! matching sync queue entry inside one SQLite transaction: a crash can never
//! leave a pending row without a queue entry, or a queue entry without its
//! row. Reads are served entirely from the local database.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::DbPool;
use crate::models::{
  CheckIn, PersonalRecord, SyncOp, SyncStatus, TrackedTable, WorkoutLog,
};
use crate::queue;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("{0} not found: {1}")]
  NotFound(&'static str, String),

  #[error("Invalid data: {0}")]
  Invalid(String),
}

impl serde::Serialize for StoreError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Local Store
/// ---------------------------------------------------------------------------

pub struct LocalStore {
  db: DbPool,
}

impl LocalStore {
  pub fn new(db: DbPool) -> Self {
    Self { db }
  }

  pub fn pool(&self) -> &DbPool {
    &self.db
  }

  /// ---------------------------------------------------------------------------
  /// Workout Logs
  /// ---------------------------------------------------------------------------

  /// Upsert a workout log and queue it for sync as a single transaction.
  pub async fn put_workout_log(&self, log: &WorkoutLog) -> Result<(), StoreError> {
    let exercises_json = serde_json::to_string(&log.exercises)?;
    let records_json = serde_json::to_string(&log.records)?;
    let payload = serde_json::to_value(log)?;

    let mut tx = self.db.begin().await?;

    let existing: Option<(String,)> =
      sqlx::query_as("SELECT id FROM workout_logs WHERE id = ?1")
        .bind(&log.id)
        .fetch_optional(&mut *tx)
        .await?;
    let op = if existing.is_some() { SyncOp::Update } else { SyncOp::Insert };

    sqlx::query(
      r#"
      INSERT INTO workout_logs (
        id, user_id, plan_id, log_date, started_at, completed_at,
        duration_minutes, notes, mood, energy, used_rest_timer,
        exercises_json, records_json, sync_status, updated_at
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
      ON CONFLICT(id) DO UPDATE SET
        plan_id = excluded.plan_id,
        log_date = excluded.log_date,
        started_at = excluded.started_at,
        completed_at = excluded.completed_at,
        duration_minutes = excluded.duration_minutes,
        notes = excluded.notes,
        mood = excluded.mood,
        energy = excluded.energy,
        used_rest_timer = excluded.used_rest_timer,
        exercises_json = excluded.exercises_json,
        records_json = excluded.records_json,
        sync_status = excluded.sync_status,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(&log.id)
    .bind(&log.user_id)
    .bind(&log.plan_id)
    .bind(log.log_date)
    .bind(log.started_at)
    .bind(log.completed_at)
    .bind(log.duration_minutes)
    .bind(&log.notes)
    .bind(log.mood)
    .bind(log.energy)
    .bind(log.used_rest_timer)
    .bind(&exercises_json)
    .bind(&records_json)
    .bind(log.sync_status.to_string())
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    queue::enqueue(&mut tx, TrackedTable::WorkoutLogs, op, &log.id, &payload).await?;
    tx.commit().await?;

    Ok(())
  }

  pub async fn get_workout_log(&self, id: &str) -> Result<WorkoutLog, StoreError> {
    let row = sqlx::query("SELECT * FROM workout_logs WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?
      .ok_or_else(|| StoreError::NotFound("Workout log", id.to_string()))?;

    row_to_workout_log(&row)
  }

  /// Recent history for the given user, newest first.
  pub async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, StoreError> {
    let rows = sqlx::query(
      "SELECT * FROM workout_logs WHERE user_id = ?1 ORDER BY started_at DESC LIMIT 100",
    )
    .bind(user_id)
    .fetch_all(&self.db)
    .await?;

    rows.iter().map(row_to_workout_log).collect()
  }

  /// The user's in-progress session, if any.
  pub async fn active_workout(&self, user_id: &str) -> Result<Option<WorkoutLog>, StoreError> {
    let row = sqlx::query(
      r#"
      SELECT * FROM workout_logs
      WHERE user_id = ?1 AND completed_at IS NULL
      ORDER BY started_at DESC LIMIT 1
      "#,
    )
    .bind(user_id)
    .fetch_optional(&self.db)
    .await?;

    row.as_ref().map(row_to_workout_log).transpose()
  }

  /// Remove a workout log and queue the deletion, as a single transaction.
  /// Only ever called on explicit user request.
  pub async fn delete_workout_log(&self, id: &str) -> Result<(), StoreError> {
    let mut tx = self.db.begin().await?;

    let result = sqlx::query("DELETE FROM workout_logs WHERE id = ?1")
      .bind(id)
      .execute(&mut *tx)
      .await?;
    if result.rows_affected() == 0 {
      return Err(StoreError::NotFound("Workout log", id.to_string()));
    }

    let payload = serde_json::json!({ "id": id });
    queue::enqueue(&mut tx, TrackedTable::WorkoutLogs, SyncOp::Delete, id, &payload).await?;
    tx.commit().await?;

    Ok(())
  }

  /// ---------------------------------------------------------------------------
  /// Personal Records
  /// ---------------------------------------------------------------------------

  pub async fn put_personal_record(&self, record: &PersonalRecord) -> Result<(), StoreError> {
    let payload = serde_json::to_value(record)?;

    let mut tx = self.db.begin().await?;

    let existing: Option<(String,)> =
      sqlx::query_as("SELECT id FROM personal_records WHERE id = ?1")
        .bind(&record.id)
        .fetch_optional(&mut *tx)
        .await?;
    let op = if existing.is_some() { SyncOp::Update } else { SyncOp::Insert };

    sqlx::query(
      r#"
      INSERT INTO personal_records (
        id, user_id, exercise_id, exercise_name, record_type,
        value, previous_value, achieved_at, sync_status
      )
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
      ON CONFLICT(id) DO UPDATE SET
        sync_status = excluded.sync_status
      "#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.exercise_id)
    .bind(&record.exercise_name)
    .bind(record.record_type.to_string())
    .bind(record.value)
    .bind(record.previous_value)
    .bind(record.achieved_at)
    .bind(record.sync_status.to_string())
    .execute(&mut *tx)
    .await?;

    queue::enqueue(&mut tx, TrackedTable::PersonalRecords, op, &record.id, &payload).await?;
    tx.commit().await?;

    Ok(())
  }

  pub async fn get_personal_record(&self, id: &str) -> Result<PersonalRecord, StoreError> {
    let row = sqlx::query("SELECT * FROM personal_records WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?
      .ok_or_else(|| StoreError::NotFound("Personal record", id.to_string()))?;

    row_to_personal_record(&row)
  }

  pub async fn list_personal_records(
    &self,
    user_id: &str,
    exercise_id: Option<&str>,
  ) -> Result<Vec<PersonalRecord>, StoreError> {
    let rows = match exercise_id {
      Some(exercise_id) => {
        sqlx::query(
          r#"
          SELECT * FROM personal_records
          WHERE user_id = ?1 AND exercise_id = ?2
          ORDER BY achieved_at DESC
          "#,
        )
        .bind(user_id)
        .bind(exercise_id)
        .fetch_all(&self.db)
        .await?
      }
      None => {
        sqlx::query(
          "SELECT * FROM personal_records WHERE user_id = ?1 ORDER BY achieved_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?
      }
    };

    rows.iter().map(row_to_personal_record).collect()
  }

  /// ---------------------------------------------------------------------------
  /// Check-Ins
  /// ---------------------------------------------------------------------------

  pub async fn put_check_in(&self, check_in: &CheckIn) -> Result<(), StoreError> {
    let payload = serde_json::to_value(check_in)?;

    let mut tx = self.db.begin().await?;

    let existing: Option<(String,)> =
      sqlx::query_as("SELECT id FROM check_ins WHERE id = ?1")
        .bind(&check_in.id)
        .fetch_optional(&mut *tx)
        .await?;
    let op = if existing.is_some() { SyncOp::Update } else { SyncOp::Insert };

    sqlx::query(
      r#"
      INSERT INTO check_ins (id, user_id, gym_id, log_date, checked_in_at, sync_status)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      ON CONFLICT(id) DO UPDATE SET
        sync_status = excluded.sync_status
      "#,
    )
    .bind(&check_in.id)
    .bind(&check_in.user_id)
    .bind(&check_in.gym_id)
    .bind(check_in.log_date)
    .bind(check_in.checked_in_at)
    .bind(check_in.sync_status.to_string())
    .execute(&mut *tx)
    .await?;

    queue::enqueue(&mut tx, TrackedTable::CheckIns, op, &check_in.id, &payload).await?;
    tx.commit().await?;

    Ok(())
  }

  pub async fn get_check_in(&self, id: &str) -> Result<CheckIn, StoreError> {
    let row = sqlx::query("SELECT * FROM check_ins WHERE id = ?1")
      .bind(id)
      .fetch_optional(&self.db)
      .await?
      .ok_or_else(|| StoreError::NotFound("Check-in", id.to_string()))?;

    row_to_check_in(&row)
  }

  /// ---------------------------------------------------------------------------
  /// Conflict Resolution
  /// ---------------------------------------------------------------------------

  /// Put a conflicted row back on the sync path. The cloud API upserts by id
  /// on both create and update, so a re-queued update is safe either way.
  pub async fn retry_conflict(&self, table: TrackedTable, row_id: &str) -> Result<(), StoreError> {
    match table {
      TrackedTable::WorkoutLogs => {
        let mut log = self.get_workout_log(row_id).await?;
        log.sync_status = SyncStatus::Pending;
        self.put_workout_log(&log).await
      }
      TrackedTable::PersonalRecords => {
        let mut record = self.get_personal_record(row_id).await?;
        record.sync_status = SyncStatus::Pending;
        self.put_personal_record(&record).await
      }
      TrackedTable::CheckIns => {
        let mut check_in = self.get_check_in(row_id).await?;
        check_in.sync_status = SyncStatus::Pending;
        self.put_check_in(&check_in).await
      }
    }
  }
}

/// Update only the sync status of a row. Used by the drainer, which never
/// touches data fields.
pub async fn mark_sync_status(
  db: &DbPool,
  table: TrackedTable,
  row_id: &str,
  status: SyncStatus,
) -> Result<(), StoreError> {
  let sql = format!("UPDATE {} SET sync_status = ?1 WHERE id = ?2", table.as_str());
  sqlx::query(&sql)
    .bind(status.to_string())
    .bind(row_id)
    .execute(db)
    .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Row Mapping
/// ---------------------------------------------------------------------------

fn row_to_workout_log(row: &SqliteRow) -> Result<WorkoutLog, StoreError> {
  let exercises_json: String = row.get("exercises_json");
  let records_json: String = row.get("records_json");
  let status_str: String = row.get("sync_status");

  Ok(WorkoutLog {
    id: row.get("id"),
    user_id: row.get("user_id"),
    plan_id: row.get("plan_id"),
    log_date: row.get("log_date"),
    started_at: row.get("started_at"),
    completed_at: row.get("completed_at"),
    duration_minutes: row.get("duration_minutes"),
    notes: row.get("notes"),
    mood: row.get("mood"),
    energy: row.get("energy"),
    used_rest_timer: row.get("used_rest_timer"),
    exercises: serde_json::from_str(&exercises_json)?,
    records: serde_json::from_str(&records_json)?,
    sync_status: status_str.parse().unwrap_or_default(),
  })
}

fn row_to_personal_record(row: &SqliteRow) -> Result<PersonalRecord, StoreError> {
  let type_str: String = row.get("record_type");
  let status_str: String = row.get("sync_status");

  Ok(PersonalRecord {
    id: row.get("id"),
    user_id: row.get("user_id"),
    exercise_id: row.get("exercise_id"),
    exercise_name: row.get("exercise_name"),
    record_type: type_str.parse().map_err(StoreError::Invalid)?,
    value: row.get("value"),
    previous_value: row.get("previous_value"),
    achieved_at: row.get("achieved_at"),
    sync_status: status_str.parse().unwrap_or_default(),
  })
}

fn row_to_check_in(row: &SqliteRow) -> Result<CheckIn, StoreError> {
  let status_str: String = row.get("sync_status");

  Ok(CheckIn {
    id: row.get("id"),
    user_id: row.get("user_id"),
    gym_id: row.get("gym_id"),
    log_date: row.get("log_date"),
    checked_in_at: row.get("checked_in_at"),
    sync_status: status_str.parse().unwrap_or_default(),
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
