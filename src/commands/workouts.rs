use crate::db::AppState;
use crate::models::{NewSet, PersonalRecord, WorkoutLog};
use crate::workouts;
use chrono::{Local, Utc};
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Workout Session Commands
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn start_workout(
  state: State<'_, Arc<AppState>>,
  user_id: String,
  plan_id: Option<String>,
) -> Result<WorkoutLog, String> {
  workouts::start_workout(
    &state.store(),
    &user_id,
    plan_id,
    Local::now().date_naive(),
    Utc::now(),
  )
  .await
}

#[tauri::command]
pub async fn add_exercise(
  state: State<'_, Arc<AppState>>,
  log_id: String,
  exercise_id: String,
  exercise_name: String,
) -> Result<WorkoutLog, String> {
  workouts::add_exercise(&state.store(), &log_id, &exercise_id, &exercise_name).await
}

/// Log one set. Returns the personal records the set achieved, if any, so
/// the UI can celebrate them immediately.
#[tauri::command]
pub async fn log_set(
  state: State<'_, Arc<AppState>>,
  log_id: String,
  exercise_id: String,
  exercise_name: String,
  set: NewSet,
) -> Result<Vec<PersonalRecord>, String> {
  workouts::log_set(
    &state.store(),
    &state.records_lock,
    &log_id,
    &exercise_id,
    &exercise_name,
    set,
    Utc::now(),
  )
  .await
}

#[tauri::command]
pub async fn complete_workout(
  state: State<'_, Arc<AppState>>,
  log_id: String,
  duration_minutes: Option<i64>,
  notes: Option<String>,
  mood: Option<i64>,
  energy: Option<i64>,
  used_rest_timer: Option<bool>,
) -> Result<WorkoutLog, String> {
  workouts::complete_workout(
    &state.store(),
    &log_id,
    duration_minutes,
    notes,
    mood,
    energy,
    used_rest_timer.unwrap_or(false),
    Utc::now(),
  )
  .await
}

#[tauri::command]
pub async fn delete_workout(
  state: State<'_, Arc<AppState>>,
  log_id: String,
) -> Result<(), String> {
  workouts::delete_workout(&state.store(), &log_id).await
}

#[tauri::command]
pub async fn get_active_workout(
  state: State<'_, Arc<AppState>>,
  user_id: String,
) -> Result<Option<WorkoutLog>, String> {
  state
    .store()
    .active_workout(&user_id)
    .await
    .map_err(|e| e.to_string())
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
  async fn test_active_workout_lifecycle() {
    let pool = setup_test_db().await;
    let state = Arc::new(AppState::new(pool.clone()));
    let app = tauri::test::mock_app();
    app.manage(state);

    let none = get_active_workout(app.state(), "user-1".to_string())
      .await
      .expect("Should query");
    assert!(none.is_none());

    let log = start_workout(app.state(), "user-1".to_string(), None)
      .await
      .expect("Should start");

    let active = get_active_workout(app.state(), "user-1".to_string())
      .await
      .expect("Should query")
      .expect("Session should be active");
    assert_eq!(active.id, log.id);

    complete_workout(
      app.state(),
      log.id.clone(),
      Some(45),
      None,
      Some(4),
      Some(4),
      None,
    )
    .await
    .expect("Should complete");

    let after = get_active_workout(app.state(), "user-1".to_string())
      .await
      .expect("Should query");
    assert!(after.is_none());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  #[serial]
  async fn test_log_set_returns_records_for_celebration() {
    let pool = setup_test_db().await;
    let state = Arc::new(AppState::new(pool.clone()));
    let app = tauri::test::mock_app();
    app.manage(state);

    let log = start_workout(app.state(), "user-1".to_string(), None)
      .await
      .expect("Should start");

    let set = |weight: f64| NewSet {
      reps: 5,
      weight_kg: Some(weight),
      duration_seconds: None,
      distance_meters: None,
      completed: true,
      rpe: None,
    };

    let first = log_set(
      app.state(),
      log.id.clone(),
      "deadlift".to_string(),
      "Deadlift".to_string(),
      set(140.0),
    )
    .await
    .expect("Should log");
    assert!(first.is_empty(), "Baseline set celebrates nothing");

    let second = log_set(
      app.state(),
      log.id.clone(),
      "deadlift".to_string(),
      "Deadlift".to_string(),
      set(150.0),
    )
    .await
    .expect("Should log");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].value, 150.0);

    teardown_test_db(pool).await;
  }
}
