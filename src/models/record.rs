use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sync::SyncStatus;

/// Which performance metric a record tracks. The four types are independent;
/// one set can produce several simultaneous records for the same exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
  Weight,
  Reps,
  Duration,
  Distance,
}

impl RecordType {
  pub const ALL: [RecordType; 4] = [
    RecordType::Weight,
    RecordType::Reps,
    RecordType::Duration,
    RecordType::Distance,
  ];
}

impl std::fmt::Display for RecordType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Weight => write!(f, "weight"),
      Self::Reps => write!(f, "reps"),
      Self::Duration => write!(f, "duration"),
      Self::Distance => write!(f, "distance"),
    }
  }
}

impl std::str::FromStr for RecordType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "weight" => Ok(Self::Weight),
      "reps" => Ok(Self::Reps),
      "duration" => Ok(Self::Duration),
      "distance" => Ok(Self::Distance),
      _ => Err(format!("Unknown record type: {}", s)),
    }
  }
}

/// A personal record. Written only by the record engine, never mutated;
/// a later, larger value supersedes it with a fresh row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
  pub id: String,
  pub user_id: String,
  pub exercise_id: String,
  pub exercise_name: String,
  pub record_type: RecordType,
  pub value: f64,
  /// The maximum this value beat. None only for rows that arrived from the
  /// cloud without one.
  pub previous_value: Option<f64>,
  pub achieved_at: DateTime<Utc>,
  pub sync_status: SyncStatus,
}

impl PersonalRecord {
  pub fn new(
    user_id: &str,
    exercise_id: &str,
    exercise_name: &str,
    record_type: RecordType,
    value: f64,
    previous_value: Option<f64>,
    achieved_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      exercise_id: exercise_id.to_string(),
      exercise_name: exercise_name.to_string(),
      record_type,
      value,
      previous_value,
      achieved_at,
      sync_status: SyncStatus::Pending,
    }
  }
}
