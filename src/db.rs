use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tauri::Manager;
use tokio::sync::{Mutex, Notify};

use crate::drainer::SyncDrainer;
use crate::remote::{CloudRemote, RemoteConfig};
use crate::store::LocalStore;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool and the
/// long-lived sync machinery.
pub struct AppState {
  pub db: DbPool,
  /// Serializes the record engine's scan-then-write so two sets completed
  /// in rapid succession cannot both claim the same record.
  pub records_lock: Mutex<()>,
  /// Nudges the background drainer (connectivity regained, app foregrounded).
  pub flush: Arc<Notify>,
  /// None when the cloud API is not configured; local writes still work.
  pub drainer: Option<Arc<SyncDrainer<CloudRemote>>>,
}

impl AppState {
  pub fn new(db: DbPool) -> Self {
    let drainer = RemoteConfig::from_env()
      .ok()
      .map(|config| Arc::new(SyncDrainer::new(db.clone(), CloudRemote::new(config))));

    Self {
      db,
      records_lock: Mutex::new(()),
      flush: Arc::new(Notify::new()),
      drainer,
    }
  }

  pub fn store(&self) -> LocalStore {
    LocalStore::new(self.db.clone())
  }
}

/// Get the path to the database file
/// Stored in: ~/Library/Application Support/com.ironlog.app/iron-log.db
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<PathBuf, Box<dyn std::error::Error>> {
  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| format!("Failed to get app data dir: {}", e))?;

  // Create directory if it doesn't exist
  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("iron-log.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  println!("Initializing database at: {}", db_path.display());

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  println!("Database initialized successfully");

  Ok(pool)
}
