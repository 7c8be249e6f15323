use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sync::SyncStatus;

/// Catalog exercise. Shipped with the app, referenced by id from set logs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Exercise {
  pub id: String,
  pub name: String,
  pub muscle_group: Option<String>,
  pub equipment: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

/// A gym attendance check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
  pub id: String,
  pub user_id: String,
  pub gym_id: Option<String>,
  pub log_date: NaiveDate,
  pub checked_in_at: DateTime<Utc>,
  pub sync_status: SyncStatus,
}

impl CheckIn {
  pub fn new(
    user_id: &str,
    gym_id: Option<String>,
    log_date: NaiveDate,
    checked_in_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      user_id: user_id.to_string(),
      gym_id,
      log_date,
      checked_in_at,
      sync_status: SyncStatus::Pending,
    }
  }
}

/// Gym announcement pulled from the cloud. Never written locally.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Announcement {
  pub id: String,
  pub title: String,
  pub body: String,
  pub published_at: DateTime<Utc>,
  pub created_at: Option<DateTime<Utc>>,
}
