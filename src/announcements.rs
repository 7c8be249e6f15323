//! Pull-down sync for gym announcements.
//!
//! The one flow that reads from the cloud instead of writing to it: fetch
//! rows published after the local high-water mark, insert-or-ignore by id,
//! and record the sync time. Pull failures never block local writes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbPool;
use crate::models::Announcement;
use crate::remote::{CloudRemote, RemoteError};

#[derive(Serialize)]
pub struct AnnouncementSyncResult {
  pub new_announcements: usize,
  pub total_fetched: usize,
}

/// Sync announcements from the cloud into the local table.
pub async fn sync_announcements(
  db: &DbPool,
  remote: &CloudRemote,
) -> Result<AnnouncementSyncResult, RemoteError> {
  // Lexicographic MAX over RFC 3339 text is chronological.
  let after: Option<DateTime<Utc>> =
    sqlx::query_scalar("SELECT MAX(published_at) FROM announcements")
      .fetch_one(db)
      .await
      .map_err(|e| RemoteError::Database(e.to_string()))?;

  let fetched = remote.fetch_announcements(after).await?;
  let total_fetched = fetched.len();

  let mut new_count = 0;
  let mut latest = after;
  for announcement in &fetched {
    let result = sqlx::query(
      r#"
      INSERT INTO announcements (id, title, body, published_at)
      VALUES (?1, ?2, ?3, ?4)
      ON CONFLICT(id) DO NOTHING
      "#,
    )
    .bind(&announcement.id)
    .bind(&announcement.title)
    .bind(&announcement.body)
    .bind(announcement.published_at)
    .execute(db)
    .await
    .map_err(|e| RemoteError::Database(e.to_string()))?;

    if result.rows_affected() > 0 {
      new_count += 1;
    }
    if latest.is_none_or(|l| announcement.published_at > l) {
      latest = Some(announcement.published_at);
    }
  }

  sqlx::query(
    r#"
    UPDATE sync_state
    SET last_sync_at = CURRENT_TIMESTAMP, last_activity_at = ?1
    WHERE source = 'announcements'
    "#,
  )
  .bind(latest)
  .execute(db)
  .await
  .map_err(|e| RemoteError::Database(e.to_string()))?;

  println!(
    "Announcement sync complete: {} new (fetched {})",
    new_count, total_fetched
  );

  Ok(AnnouncementSyncResult {
    new_announcements: new_count,
    total_fetched,
  })
}

/// Latest announcements for the dashboard.
pub async fn list_announcements(db: &DbPool, limit: i64) -> Result<Vec<Announcement>, String> {
  sqlx::query_as::<_, Announcement>(
    "SELECT * FROM announcements ORDER BY published_at DESC LIMIT ?1",
  )
  .bind(limit)
  .fetch_all(db)
  .await
  .map_err(|e| format!("Failed to fetch announcements: {}", e))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
