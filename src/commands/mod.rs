pub mod streaks;
pub mod sync;
pub mod workouts;

use crate::announcements;
use crate::db::AppState;
use crate::models::sync::SyncState;
use crate::models::{Announcement, Exercise, PersonalRecord, WorkoutLog};
use std::sync::Arc;
use tauri::State;

#[tauri::command]
pub async fn get_workout_logs(
  state: State<'_, Arc<AppState>>,
  user_id: String,
) -> Result<Vec<WorkoutLog>, String> {
  state
    .store()
    .list_workout_logs(&user_id)
    .await
    .map_err(|e| format!("Failed to fetch workout logs: {}", e))
}

#[tauri::command]
pub async fn get_personal_records(
  state: State<'_, Arc<AppState>>,
  user_id: String,
  exercise_id: Option<String>,
) -> Result<Vec<PersonalRecord>, String> {
  state
    .store()
    .list_personal_records(&user_id, exercise_id.as_deref())
    .await
    .map_err(|e| format!("Failed to fetch personal records: {}", e))
}

#[tauri::command]
pub async fn get_exercises(state: State<'_, Arc<AppState>>) -> Result<Vec<Exercise>, String> {
  sqlx::query_as::<_, Exercise>("SELECT * FROM exercises ORDER BY name")
    .fetch_all(&state.db)
    .await
    .map_err(|e| format!("Failed to fetch exercises: {}", e))
}

#[tauri::command]
pub async fn get_announcements(
  state: State<'_, Arc<AppState>>,
) -> Result<Vec<Announcement>, String> {
  announcements::list_announcements(&state.db, 20).await
}

#[tauri::command]
pub async fn get_sync_state(
  state: State<'_, Arc<AppState>>,
) -> Result<Vec<SyncState>, String> {
  sqlx::query_as::<_, SyncState>("SELECT * FROM sync_state")
    .fetch_all(&state.db)
    .await
    .map_err(|e| format!("Failed to fetch sync state: {}", e))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use serial_test::serial;
  use tauri::Manager;

  #[tokio::test]
  #[serial]
  async fn test_get_exercises_returns_catalog() {
    let pool = setup_test_db().await;
    let state = Arc::new(AppState::new(pool.clone()));
    let app = tauri::test::mock_app();
    app.manage(state);

    let exercises = get_exercises(app.state()).await.expect("Should list");
    assert!(exercises.iter().any(|e| e.id == "squat"));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_get_workout_logs_empty() {
    let pool = setup_test_db().await;
    let state = Arc::new(AppState::new(pool.clone()));
    let app = tauri::test::mock_app();
    app.manage(state);

    let logs = get_workout_logs(app.state(), "user-1".to_string())
      .await
      .expect("Should list");
    assert!(logs.is_empty());

    teardown_test_db(pool).await;
  }
}
