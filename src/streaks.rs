//! Streak Engine
//!
//! Computes consecutive-day activity streaks from timestamped history. Days
//! are the user's local calendar days (`log_date`, stamped at write time),
//! never UTC. The engine is pure and read-only: it never writes, and any
//! load failure degrades to a zero streak rather than an error, since
//! streaks are a best-effort convenience.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct StreakState {
    pub current_streak: i64,
    pub last_activity_date: Option<NaiveDate>,
}

/// Walk backward from `today` over deduplicated activity days, counting
/// consecutive days until the first gap.
///
/// Today not yet being logged does not break the run (the walk starts at
/// yesterday instead), but a full missed day does: activity only on days
/// before a two-day gap ending today yields a zero streak.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> StreakState {
    let mut sorted: Vec<NaiveDate> = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let last_activity_date = sorted.last().copied();

    let mut cursor = if sorted.binary_search(&today).is_ok() {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while sorted.binary_search(&cursor).is_ok() {
        streak += 1;
        cursor = cursor - Duration::days(1);
    }

    StreakState {
        current_streak: streak,
        last_activity_date,
    }
}

/// Workout streak: completed sessions only. An in-progress session does not
/// count until `complete_workout` runs.
pub async fn workout_streak(db: &DbPool, user_id: &str, today: NaiveDate) -> StreakState {
    let days = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT DISTINCT log_date FROM workout_logs
        WHERE user_id = ?1 AND completed_at IS NOT NULL
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await;

    match days {
        Ok(days) => current_streak(&days, today),
        Err(e) => {
            eprintln!("Failed to load workout streak: {}", e);
            StreakState::default()
        }
    }
}

/// Gym attendance streak, from check-ins.
pub async fn check_in_streak(db: &DbPool, user_id: &str, today: NaiveDate) -> StreakState {
    let days = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT DISTINCT log_date FROM check_ins WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_all(db)
    .await;

    match days {
        Ok(days) => current_streak(&days, today),
        Err(e) => {
            eprintln!("Failed to load check-in streak: {}", e);
            StreakState::default()
        }
    }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
