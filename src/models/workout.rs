use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::record::PersonalRecord;
use crate::models::sync::SyncStatus;

/// A single set within an exercise entry. A set with `completed = false`
/// contributes to neither records nor totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
  pub set_number: i64,
  pub reps: i64,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub weight_kg: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub duration_seconds: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub distance_meters: Option<f64>,
  pub completed: bool,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub rpe: Option<f64>,
}

/// Parameters for logging a new set. The service assigns `set_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSet {
  pub reps: i64,
  #[serde(default)]
  pub weight_kg: Option<f64>,
  #[serde(default)]
  pub duration_seconds: Option<i64>,
  #[serde(default)]
  pub distance_meters: Option<f64>,
  pub completed: bool,
  #[serde(default)]
  pub rpe: Option<f64>,
}

/// One exercise within a workout, with its ordered sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
  pub exercise_id: String,
  pub exercise_name: String,
  pub sets: Vec<SetLog>,
}

impl ExerciseEntry {
  pub fn new(exercise_id: &str, exercise_name: &str) -> Self {
    Self {
      exercise_id: exercise_id.to_string(),
      exercise_name: exercise_name.to_string(),
      sets: Vec::new(),
    }
  }

  /// Set numbers are strictly increasing within an entry.
  pub fn next_set_number(&self) -> i64 {
    self.sets.last().map(|s| s.set_number + 1).unwrap_or(1)
  }
}

/// A workout session. `completed_at = None` means in progress: the session
/// is mutable and not yet counted by the streak engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
  pub id: String,
  pub user_id: String,
  pub plan_id: Option<String>,
  /// User-local calendar day, stamped at write time. Groups the session for
  /// streaks and history screens.
  pub log_date: NaiveDate,
  pub started_at: DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
  pub duration_minutes: Option<i64>,
  pub notes: Option<String>,
  pub mood: Option<i64>,
  pub energy: Option<i64>,
  pub used_rest_timer: bool,
  pub exercises: Vec<ExerciseEntry>,
  /// Records achieved during this session, mirrored from the record engine
  /// so the session summary can render them without a second query.
  pub records: Vec<PersonalRecord>,
  pub sync_status: SyncStatus,
}

impl WorkoutLog {
  pub fn new(
    user_id: &str,
    plan_id: Option<String>,
    log_date: NaiveDate,
    started_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      plan_id,
      log_date,
      started_at,
      completed_at: None,
      duration_minutes: None,
      notes: None,
      mood: None,
      energy: None,
      used_rest_timer: false,
      exercises: Vec::new(),
      records: Vec::new(),
      sync_status: SyncStatus::Pending,
    }
  }

  pub fn is_in_progress(&self) -> bool {
    self.completed_at.is_none()
  }

  pub fn entry_mut(&mut self, exercise_id: &str) -> Option<&mut ExerciseEntry> {
    self.exercises.iter_mut().find(|e| e.exercise_id == exercise_id)
  }
}
