//! Workout Session Service
//!
//! Load -> mutate -> save flows for the live workout session. Every write
//! goes through the local store first (and so through the sync queue); the
//! record engine runs synchronously at each completed set so the UI can
//! celebrate a record the moment it happens.

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::models::{ExerciseEntry, NewSet, PersonalRecord, RecordType, SetLog, WorkoutLog};
use crate::records;
use crate::store::LocalStore;

/// Start a new session for the user. One in-progress session at a time.
pub async fn start_workout(
    store: &LocalStore,
    user_id: &str,
    plan_id: Option<String>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<WorkoutLog, String> {
    if let Some(active) = store
        .active_workout(user_id)
        .await
        .map_err(|e| format!("Failed to check active workout: {}", e))?
    {
        return Err(format!(
            "A workout is already in progress (started {})",
            active.started_at
        ));
    }

    let log = WorkoutLog::new(user_id, plan_id, today, now);
    store
        .put_workout_log(&log)
        .await
        .map_err(|e| format!("Failed to start workout: {}", e))?;

    Ok(log)
}

/// Add an exercise to the session. Adding one that is already present is a
/// no-op, so the UI can call this blindly.
pub async fn add_exercise(
    store: &LocalStore,
    log_id: &str,
    exercise_id: &str,
    exercise_name: &str,
) -> Result<WorkoutLog, String> {
    let mut log = store
        .get_workout_log(log_id)
        .await
        .map_err(|e| e.to_string())?;

    if !log.is_in_progress() {
        return Err("Workout is already completed".to_string());
    }

    if log.entry_mut(exercise_id).is_none() {
        log.exercises.push(ExerciseEntry::new(exercise_id, exercise_name));
        store
            .put_workout_log(&log)
            .await
            .map_err(|e| format!("Failed to add exercise: {}", e))?;
    }

    Ok(log)
}

/// Log one set. For a completed set, every metric present is checked
/// against the user's history; any records come back for the UI to
/// celebrate immediately and are mirrored onto the session.
pub async fn log_set(
    store: &LocalStore,
    records_lock: &Mutex<()>,
    log_id: &str,
    exercise_id: &str,
    exercise_name: &str,
    new_set: NewSet,
    now: DateTime<Utc>,
) -> Result<Vec<PersonalRecord>, String> {
    let mut log = store
        .get_workout_log(log_id)
        .await
        .map_err(|e| e.to_string())?;

    if !log.is_in_progress() {
        return Err("Workout is already completed".to_string());
    }

    if log.entry_mut(exercise_id).is_none() {
        log.exercises.push(ExerciseEntry::new(exercise_id, exercise_name));
    }
    let set = match log.entry_mut(exercise_id) {
        Some(entry) => SetLog {
            set_number: entry.next_set_number(),
            reps: new_set.reps,
            weight_kg: new_set.weight_kg,
            duration_seconds: new_set.duration_seconds,
            distance_meters: new_set.distance_meters,
            completed: new_set.completed,
            rpe: new_set.rpe,
        },
        None => return Err(format!("Exercise not in session: {}", exercise_id)),
    };

    // Record checks run against history BEFORE this set is persisted, so the
    // candidate value is compared against everything that came before it.
    let mut new_records = Vec::new();
    if set.completed {
        let _guard = records_lock.lock().await;
        for record_type in RecordType::ALL {
            let Some(value) = records::set_value(&set, record_type) else {
                continue;
            };
            match records::check_and_record(
                store,
                &log.user_id,
                exercise_id,
                exercise_name,
                record_type,
                value,
                now,
            )
            .await
            {
                Ok(Some(record)) => new_records.push(record),
                Ok(None) => {}
                // Best-effort: a failed record check never loses the set.
                Err(e) => eprintln!(
                    "Record check failed for {} {}: {}",
                    exercise_id, record_type, e
                ),
            }
        }
    }

    if let Some(entry) = log.entry_mut(exercise_id) {
        entry.sets.push(set);
    }
    log.records.extend(new_records.iter().cloned());
    store
        .put_workout_log(&log)
        .await
        .map_err(|e| format!("Failed to log set: {}", e))?;

    Ok(new_records)
}

/// Finalize the session. From here on it counts toward streaks and is
/// immutable.
pub async fn complete_workout(
    store: &LocalStore,
    log_id: &str,
    duration_minutes: Option<i64>,
    notes: Option<String>,
    mood: Option<i64>,
    energy: Option<i64>,
    used_rest_timer: bool,
    now: DateTime<Utc>,
) -> Result<WorkoutLog, String> {
    if let Some(mood) = mood {
        if !(1..=5).contains(&mood) {
            return Err(format!("Mood rating must be 1-5, got {}", mood));
        }
    }
    if let Some(energy) = energy {
        if !(1..=5).contains(&energy) {
            return Err(format!("Energy rating must be 1-5, got {}", energy));
        }
    }

    let mut log = store
        .get_workout_log(log_id)
        .await
        .map_err(|e| e.to_string())?;

    if !log.is_in_progress() {
        return Err("Workout is already completed".to_string());
    }

    log.completed_at = Some(now);
    log.duration_minutes =
        duration_minutes.or_else(|| Some((now - log.started_at).num_minutes()));
    log.notes = notes;
    log.mood = mood;
    log.energy = energy;
    log.used_rest_timer = used_rest_timer;

    store
        .put_workout_log(&log)
        .await
        .map_err(|e| format!("Failed to complete workout: {}", e))?;

    Ok(log)
}

/// Remove a session outright. Explicit user request only.
pub async fn delete_workout(store: &LocalStore, log_id: &str) -> Result<(), String> {
    store
        .delete_workout_log(log_id)
        .await
        .map_err(|e| e.to_string())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SyncOp, SyncStatus, TrackedTable};
    use crate::test_utils::*;

    fn weight_set(weight_kg: f64) -> NewSet {
        NewSet {
            reps: 5,
            weight_kg: Some(weight_kg),
            duration_seconds: None,
            distance_meters: None,
            completed: true,
            rpe: None,
        }
    }

    #[tokio::test]
    async fn test_start_workout_creates_pending_in_progress_log() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());

        let log = start_workout(
            &store,
            "user-1",
            Some("plan-ppl".to_string()),
            date_days_ago(0),
            datetime_days_ago(0),
        )
        .await
        .expect("Should start");

        assert!(log.is_in_progress());
        assert!(log.exercises.is_empty());
        assert_eq!(log.sync_status, SyncStatus::Pending);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_second_concurrent_start_is_rejected() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());

        start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0))
            .await
            .expect("Should start");
        let result =
            start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0)).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("already in progress"));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_log_set_assigns_monotonic_set_numbers() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());
        let lock = Mutex::new(());

        let log = start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0))
            .await
            .unwrap();

        for weight in [60.0, 60.0, 62.5] {
            log_set(
                &store,
                &lock,
                &log.id,
                "bench-press",
                "Bench Press",
                weight_set(weight),
                datetime_days_ago(0),
            )
            .await
            .expect("Should log set");
        }

        let loaded = store.get_workout_log(&log.id).await.unwrap();
        let sets = &loaded.exercises[0].sets;
        assert_eq!(sets.len(), 3);
        assert_eq!(
            sets.iter().map(|s| s.set_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_log_set_on_completed_workout_is_rejected() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());
        let lock = Mutex::new(());

        let log = start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0))
            .await
            .unwrap();
        complete_workout(
            &store,
            &log.id,
            Some(45),
            None,
            None,
            None,
            false,
            datetime_days_ago(0),
        )
        .await
        .unwrap();

        let result = log_set(
            &store,
            &lock,
            &log.id,
            "squat",
            "Back Squat",
            weight_set(80.0),
            datetime_days_ago(0),
        )
        .await;
        assert!(result.is_err());

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_complete_workout_validates_ratings() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());

        let log = start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0))
            .await
            .unwrap();

        let result = complete_workout(
            &store,
            &log.id,
            None,
            None,
            Some(6),
            None,
            false,
            datetime_days_ago(0),
        )
        .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Mood rating"));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_complete_workout_defaults_duration_from_wall_clock() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());

        let started = datetime_days_ago(0);
        let log = start_workout(&store, "user-1", None, date_days_ago(0), started)
            .await
            .unwrap();

        let finished = started + chrono::Duration::minutes(52);
        let completed = complete_workout(
            &store, &log.id, None, None, Some(4), Some(3), true, finished,
        )
        .await
        .expect("Should complete");

        assert_eq!(completed.duration_minutes, Some(52));
        assert_eq!(completed.completed_at, Some(finished));

        teardown_test_db(pool).await;
    }

    /// The end-to-end flow: start, three squat sets at 80/85/90, exactly
    /// two records, and the log stays pending until the drainer runs.
    #[tokio::test]
    async fn test_session_awards_records_and_stays_pending() {
        let pool = setup_test_db().await;
        let store = crate::store::LocalStore::new(pool.clone());
        let lock = Mutex::new(());

        let log = start_workout(&store, "user-1", None, date_days_ago(0), datetime_days_ago(0))
            .await
            .unwrap();

        let mut awarded = Vec::new();
        for weight in [80.0, 85.0, 90.0] {
            let records = log_set(
                &store,
                &lock,
                &log.id,
                "squat",
                "Back Squat",
                weight_set(weight),
                datetime_days_ago(0),
            )
            .await
            .expect("Should log set");
            awarded.extend(records);
        }

        assert_eq!(awarded.len(), 2, "85 beats 80, 90 beats 85; 80 is the baseline");
        assert_eq!(awarded[0].value, 85.0);
        assert_eq!(awarded[0].previous_value, Some(80.0));
        assert_eq!(awarded[1].value, 90.0);
        assert_eq!(awarded[1].previous_value, Some(85.0));

        let completed = complete_workout(
            &store,
            &log.id,
            Some(60),
            Some("PR day".to_string()),
            Some(5),
            Some(4),
            true,
            datetime_days_ago(0),
        )
        .await
        .expect("Should complete");

        assert_eq!(completed.sync_status, SyncStatus::Pending);
        assert_eq!(completed.records.len(), 2, "Session mirrors its records");

        // Everything the session wrote is queued, in causal order.
        let log_entries =
            crate::queue::peek_batch(&pool, TrackedTable::WorkoutLogs, 50).await.unwrap();
        assert_eq!(log_entries[0].op, SyncOp::Insert);
        assert!(log_entries[1..].iter().all(|e| e.op == SyncOp::Update));
        let record_entries =
            crate::queue::peek_batch(&pool, TrackedTable::PersonalRecords, 50).await.unwrap();
        assert_eq!(record_entries.len(), 2);

        teardown_test_db(pool).await;
    }
}
