//! Append-only sync queue (the outbox).
//!
//! Every local mutation of a tracked table lands here, inside the same
//! transaction as the row write. Entries are consumed strictly in id order
//! per table so an update can never reach the cloud before its insert, and
//! are removed only by `ack`.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use crate::db::DbPool;
use crate::models::{SyncQueueEntry, SyncOp, TrackedTable};
use crate::store::StoreError;

/// Append an entry inside the caller's transaction. The row write and the
/// queue append commit or roll back together.
pub async fn enqueue(
  tx: &mut Transaction<'_, Sqlite>,
  table: TrackedTable,
  op: SyncOp,
  row_id: &str,
  payload: &serde_json::Value,
) -> Result<(), sqlx::Error> {
  sqlx::query(
    r#"
    INSERT INTO sync_queue (table_name, row_id, op, payload_json, enqueued_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
  )
  .bind(table.as_str())
  .bind(row_id)
  .bind(op.to_string())
  .bind(payload.to_string())
  .bind(Utc::now())
  .execute(&mut **tx)
  .await?;

  Ok(())
}

/// Oldest pending entries for a table, in enqueue order.
pub async fn peek_batch(
  db: &DbPool,
  table: TrackedTable,
  limit: i64,
) -> Result<Vec<SyncQueueEntry>, StoreError> {
  let rows: Vec<(i64, String, String, String, String, chrono::DateTime<Utc>)> = sqlx::query_as(
    r#"
    SELECT id, table_name, row_id, op, payload_json, enqueued_at
    FROM sync_queue
    WHERE table_name = ?1
    ORDER BY id
    LIMIT ?2
    "#,
  )
  .bind(table.as_str())
  .bind(limit)
  .fetch_all(db)
  .await?;

  let mut entries = Vec::with_capacity(rows.len());
  for (id, table_name, row_id, op, payload_json, enqueued_at) in rows {
    entries.push(SyncQueueEntry {
      id,
      table_name,
      row_id,
      op: op.parse().map_err(StoreError::Invalid)?,
      payload: serde_json::from_str(&payload_json)?,
      enqueued_at,
    });
  }

  Ok(entries)
}

/// Remove a delivered entry. Idempotent: acking an id that is already gone
/// is a no-op, so at-least-once delivery from the drainer is safe.
pub async fn ack(db: &DbPool, entry_id: i64) -> Result<(), StoreError> {
  sqlx::query("DELETE FROM sync_queue WHERE id = ?1")
    .bind(entry_id)
    .execute(db)
    .await?;

  Ok(())
}

/// Tables that currently have pending entries.
pub async fn pending_tables(db: &DbPool) -> Result<Vec<TrackedTable>, StoreError> {
  let names: Vec<(String,)> =
    sqlx::query_as("SELECT DISTINCT table_name FROM sync_queue ORDER BY table_name")
      .fetch_all(db)
      .await?;

  // Unknown table names would mean a schema drift; they are skipped rather
  // than wedging the whole drain.
  Ok(names.into_iter().filter_map(|(n,)| n.parse().ok()).collect())
}

pub async fn depth(db: &DbPool) -> Result<i64, StoreError> {
  let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue")
    .fetch_one(db)
    .await?;
  Ok(count)
}

pub async fn depth_for(db: &DbPool, table: TrackedTable) -> Result<i64, StoreError> {
  let count: i64 =
    sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue WHERE table_name = ?1")
      .bind(table.as_str())
      .fetch_one(db)
      .await?;
  Ok(count)
}

/// Entries still queued for one row. The drainer marks a row synced only
/// once this reaches zero.
pub async fn depth_for_row(
  db: &DbPool,
  table: TrackedTable,
  row_id: &str,
) -> Result<i64, StoreError> {
  let count: i64 = sqlx::query_scalar(
    "SELECT COUNT(*) FROM sync_queue WHERE table_name = ?1 AND row_id = ?2",
  )
  .bind(table.as_str())
  .bind(row_id)
  .fetch_one(db)
  .await?;
  Ok(count)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
