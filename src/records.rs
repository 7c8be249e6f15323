//! Personal Record Engine
//!
//! Decides, at the moment a set is completed, whether a performance value is
//! a personal record for that exercise. The scan covers completed sets in
//! every workout log (including the in-progress session) plus previously
//! recorded records, per (user, exercise, type).
//!
//! Key principles:
//! - Strict `>`: a tie is not a record
//! - The four record types are tracked independently
//! - The first-ever value is a baseline, not a record
//! - Best-effort: malformed history is skipped, never fatal

use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::models::{ExerciseEntry, PersonalRecord, RecordType, SetLog};
use crate::store::{LocalStore, StoreError};

/// The value a set contributes toward a record type, if any.
pub fn set_value(set: &SetLog, record_type: RecordType) -> Option<f64> {
    match record_type {
        RecordType::Weight => set.weight_kg,
        RecordType::Reps => (set.reps > 0).then_some(set.reps as f64),
        RecordType::Duration => set.duration_seconds.map(|d| d as f64),
        RecordType::Distance => set.distance_meters,
    }
}

/// Check a freshly completed value and persist a record if it beats the
/// maximum ever observed. Returns the new record for immediate UI feedback.
///
/// The caller holds the app's record lock across this call so two sets
/// completed in rapid succession cannot both claim the record.
pub async fn check_and_record(
    store: &LocalStore,
    user_id: &str,
    exercise_id: &str,
    exercise_name: &str,
    record_type: RecordType,
    value: f64,
    achieved_at: DateTime<Utc>,
) -> Result<Option<PersonalRecord>, StoreError> {
    if !value.is_finite() || value <= 0.0 {
        return Ok(None);
    }

    let prior = max_observed(store.pool(), user_id, exercise_id, record_type).await?;

    match prior {
        // Nothing to beat yet: the first value only establishes the baseline.
        None => Ok(None),
        Some(max) if value > max => {
            let record = PersonalRecord::new(
                user_id,
                exercise_id,
                exercise_name,
                record_type,
                value,
                Some(max),
                achieved_at,
            );
            store.put_personal_record(&record).await?;
            Ok(Some(record))
        }
        Some(_) => Ok(None),
    }
}

/// Maximum value observed for (user, exercise, type): recorded records plus
/// raw completed sets.
async fn max_observed(
    pool: &DbPool,
    user_id: &str,
    exercise_id: &str,
    record_type: RecordType,
) -> Result<Option<f64>, StoreError> {
    let recorded: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT MAX(value) FROM personal_records
        WHERE user_id = ?1 AND exercise_id = ?2 AND record_type = ?3
        "#,
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(record_type.to_string())
    .fetch_one(pool)
    .await?;

    let logged = max_logged(pool, user_id, exercise_id, record_type).await?;

    Ok(match (recorded, logged) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    })
}

/// Maximum over completed sets in the user's workout history. In-progress
/// sessions count: a record must fire mid-session, not at the end.
async fn max_logged(
    pool: &DbPool,
    user_id: &str,
    exercise_id: &str,
    record_type: RecordType,
) -> Result<Option<f64>, StoreError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT exercises_json FROM workout_logs WHERE user_id = ?1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let mut max: Option<f64> = None;
    for (json,) in rows {
        // A malformed history row degrades to "no contribution".
        let entries: Vec<ExerciseEntry> = match serde_json::from_str(&json) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.iter().filter(|e| e.exercise_id == exercise_id) {
            for set in entry.sets.iter().filter(|s| s.completed) {
                if let Some(value) = set_value(set, record_type) {
                    max = Some(max.map_or(value, |m| m.max(value)));
                }
            }
        }
    }

    Ok(max)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
