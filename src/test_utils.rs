//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Row seeding helpers
//! - Time helpers

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Row Seeding
/// ---------------------------------------------------------------------------

/// Insert a completed workout log on the given local day, bypassing the
/// sync queue. Returns the new row id.
pub async fn seed_completed_workout(pool: &SqlitePool, user_id: &str, log_date: &str) -> String {
  let id = Uuid::new_v4().to_string();

  sqlx::query(
    r#"
    INSERT INTO workout_logs (
      id, user_id, log_date, started_at, completed_at, duration_minutes, sync_status
    )
    VALUES (?1, ?2, ?3, ?4, ?5, 60, 'synced')
    "#,
  )
  .bind(&id)
  .bind(user_id)
  .bind(log_date)
  .bind(format!("{}T10:00:00Z", log_date))
  .bind(format!("{}T11:00:00Z", log_date))
  .execute(pool)
  .await
  .expect("Failed to seed completed workout");

  id
}

/// Insert an in-progress workout log (no completed_at).
pub async fn seed_in_progress_workout(pool: &SqlitePool, user_id: &str, log_date: &str) -> String {
  let id = Uuid::new_v4().to_string();

  sqlx::query(
    r#"
    INSERT INTO workout_logs (id, user_id, log_date, started_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(&id)
  .bind(user_id)
  .bind(log_date)
  .bind(format!("{}T10:00:00Z", log_date))
  .execute(pool)
  .await
  .expect("Failed to seed in-progress workout");

  id
}

/// Insert a check-in on the given local day, bypassing the sync queue.
pub async fn seed_check_in(pool: &SqlitePool, user_id: &str, log_date: &str) -> String {
  let id = Uuid::new_v4().to_string();

  sqlx::query(
    r#"
    INSERT INTO check_ins (id, user_id, log_date, checked_in_at, sync_status)
    VALUES (?1, ?2, ?3, ?4, 'synced')
    "#,
  )
  .bind(&id)
  .bind(user_id)
  .bind(log_date)
  .bind(format!("{}T08:30:00Z", log_date))
  .execute(pool)
  .await
  .expect("Failed to seed check-in");

  id
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime N days ago from now
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// Create a NaiveDate N days ago from today
pub fn date_days_ago(days: i64) -> NaiveDate {
  Utc::now().date_naive() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workout_logs', 'personal_records', 'check_ins', 'sync_queue', 'exercises', 'announcements')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 6, "Expected 6 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_exercise_catalog_is_seeded() {
    let pool = setup_test_db().await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
      .fetch_one(&pool)
      .await
      .expect("Failed to count exercises");
    assert!(count >= 8, "Catalog should ship with exercises, got {}", count);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seeded_workouts_are_readable() {
    let pool = setup_test_db().await;

    seed_completed_workout(&pool, "user-1", "2025-07-13").await;
    seed_in_progress_workout(&pool, "user-1", "2025-07-14").await;

    let completed: i64 = sqlx::query_scalar(
      "SELECT COUNT(*) FROM workout_logs WHERE completed_at IS NOT NULL",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(completed, 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_datetime_helpers_produce_correct_dates() {
    let now = datetime_days_ago(0);
    let past = datetime_days_ago(7);

    let diff = now - past;
    assert_eq!(diff.num_days(), 7);

    assert_eq!(date_days_ago(0) - date_days_ago(3), Duration::days(3));
  }
}
