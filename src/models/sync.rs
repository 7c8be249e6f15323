use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Sync Status: lifecycle of a locally written row
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum SyncStatus {
  /// Written locally, not yet applied to the cloud store.
  #[default]
  Pending,
  /// Applied to the cloud store.
  Synced,
  /// Cloud store rejected the row; waits for manual resolution.
  Conflict,
}

impl std::fmt::Display for SyncStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Pending => write!(f, "pending"),
      Self::Synced => write!(f, "synced"),
      Self::Conflict => write!(f, "conflict"),
    }
  }
}

impl std::str::FromStr for SyncStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "synced" => Ok(Self::Synced),
      "conflict" => Ok(Self::Conflict),
      _ => Err(format!("Unknown sync status: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Sync Queue
/// ---------------------------------------------------------------------------

/// Operation carried by a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOp {
  Insert,
  Update,
  Delete,
}

impl std::fmt::Display for SyncOp {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Insert => write!(f, "insert"),
      Self::Update => write!(f, "update"),
      Self::Delete => write!(f, "delete"),
    }
  }
}

impl std::str::FromStr for SyncOp {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "insert" => Ok(Self::Insert),
      "update" => Ok(Self::Update),
      "delete" => Ok(Self::Delete),
      _ => Err(format!("Unknown sync op: {}", s)),
    }
  }
}

/// One append-only outbox entry. The autoincrement id defines FIFO order
/// within a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncQueueEntry {
  pub id: i64,
  pub table_name: String,
  pub row_id: String,
  pub op: SyncOp,
  pub payload: serde_json::Value,
  pub enqueued_at: DateTime<Utc>,
}

/// ---------------------------------------------------------------------------
/// Tracked Tables
/// ---------------------------------------------------------------------------

/// Tables whose writes flow through the sync queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedTable {
  WorkoutLogs,
  PersonalRecords,
  CheckIns,
}

impl TrackedTable {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::WorkoutLogs => "workout_logs",
      Self::PersonalRecords => "personal_records",
      Self::CheckIns => "check_ins",
    }
  }

  pub const ALL: [TrackedTable; 3] = [
    TrackedTable::WorkoutLogs,
    TrackedTable::PersonalRecords,
    TrackedTable::CheckIns,
  ];
}

impl std::str::FromStr for TrackedTable {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "workout_logs" => Ok(Self::WorkoutLogs),
      "personal_records" => Ok(Self::PersonalRecords),
      "check_ins" => Ok(Self::CheckIns),
      _ => Err(format!("Unknown tracked table: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Pull-Sync Bookkeeping
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncState {
  pub id: i64,
  pub source: String,
  pub last_sync_at: Option<DateTime<Utc>>,
  pub last_activity_at: Option<DateTime<Utc>>,
}
