//! Tauri commands for streaks and gym attendance

use chrono::{Local, Utc};
use std::sync::Arc;
use tauri::State;

use crate::attendance;
use crate::db::AppState;
use crate::models::CheckIn;
use crate::streaks::{self, StreakState};

/// Consecutive days with a completed workout, ending today or yesterday.
#[tauri::command]
pub async fn get_workout_streak(
    state: State<'_, Arc<AppState>>,
    user_id: String,
) -> Result<StreakState, String> {
    Ok(streaks::workout_streak(&state.db, &user_id, Local::now().date_naive()).await)
}

/// Consecutive days with a gym check-in.
#[tauri::command]
pub async fn get_check_in_streak(
    state: State<'_, Arc<AppState>>,
    user_id: String,
) -> Result<StreakState, String> {
    Ok(streaks::check_in_streak(&state.db, &user_id, Local::now().date_naive()).await)
}

#[tauri::command]
pub async fn check_in(
    state: State<'_, Arc<AppState>>,
    user_id: String,
    gym_id: Option<String>,
) -> Result<CheckIn, String> {
    attendance::check_in(
        &state.store(),
        &user_id,
        gym_id,
        Local::now().date_naive(),
        Utc::now(),
    )
    .await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
