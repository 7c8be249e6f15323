//! Gym attendance service.
//!
//! One check-in row per tap; the streak engine deduplicates by day.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::CheckIn;
use crate::store::LocalStore;

pub async fn check_in(
  store: &LocalStore,
  user_id: &str,
  gym_id: Option<String>,
  today: NaiveDate,
  now: DateTime<Utc>,
) -> Result<CheckIn, String> {
  let check_in = CheckIn::new(user_id, gym_id, today, now);
  store
    .put_check_in(&check_in)
    .await
    .map_err(|e| format!("Failed to check in: {}", e))?;

  Ok(check_in)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::SyncStatus;
  use crate::test_utils::*;

  #[tokio::test]
  async fn test_check_in_lands_locally_and_queues() {
    let pool = setup_test_db().await;
    let store = crate::store::LocalStore::new(pool.clone());

    let check_in = check_in(
      &store,
      "user-1",
      Some("gym-downtown".to_string()),
      date_days_ago(0),
      datetime_days_ago(0),
    )
    .await
    .expect("Should check in");

    assert_eq!(check_in.sync_status, SyncStatus::Pending);
    let loaded = store.get_check_in(&check_in.id).await.expect("Should load");
    assert_eq!(loaded, check_in);
    assert_eq!(
      crate::queue::depth_for(&pool, crate::models::TrackedTable::CheckIns)
        .await
        .unwrap(),
      1
    );

    teardown_test_db(pool).await;
  }
}
