mod announcements;
mod attendance;
mod commands;
mod db;
mod drainer;
mod models;
mod queue;
mod records;
mod remote;
mod store;
mod streaks;
mod workouts;

#[cfg(test)]
mod test_utils;

use db::AppState;
use std::sync::Arc;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tauri::Builder::default()
    .plugin(tauri_plugin_opener::init())
    .setup(|app| {
      // Initialize database and start the background drainer
      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        match db::initialize_db(&app_handle).await {
          Ok(pool) => {
            let state = Arc::new(AppState::new(pool));

            match &state.drainer {
              Some(drainer) => {
                let drainer = drainer.clone();
                let flush = state.flush.clone();
                tauri::async_runtime::spawn(async move {
                  drainer.run(flush).await;
                });
              }
              None => {
                eprintln!(
                  "Cloud sync disabled: set IRONLOG_API_BASE_URL and IRONLOG_API_KEY to enable"
                );
              }
            }

            app_handle.manage(state);
            println!("Database ready");
          }
          Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
          }
        }
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::get_workout_logs,
      commands::get_personal_records,
      commands::get_exercises,
      commands::get_announcements,
      commands::get_sync_state,
      // Workout session commands
      commands::workouts::start_workout,
      commands::workouts::add_exercise,
      commands::workouts::log_set,
      commands::workouts::complete_workout,
      commands::workouts::delete_workout,
      commands::workouts::get_active_workout,
      // Streaks and attendance
      commands::streaks::get_workout_streak,
      commands::streaks::get_check_in_streak,
      commands::streaks::check_in,
      // Sync commands
      commands::sync::get_sync_overview,
      commands::sync::flush_sync_queue,
      commands::sync::notify_online,
      commands::sync::retry_conflict,
      commands::sync::sync_announcements,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
