pub mod gym;
pub mod record;
pub mod sync;
pub mod workout;

pub use gym::{Announcement, CheckIn, Exercise};
pub use record::{PersonalRecord, RecordType};
pub use sync::{SyncOp, SyncQueueEntry, SyncStatus, TrackedTable};
pub use workout::{ExerciseEntry, NewSet, SetLog, WorkoutLog};
