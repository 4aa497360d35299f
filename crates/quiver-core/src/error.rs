//! Domain error type shared by the composer, scheduler, and retention
//! sweeps.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced by the domain operations.
///
/// Variants are grouped by how callers react to them: the `*NotFound` group
/// means the referenced entity does not exist, the structural group
/// (`DuplicateDayNumber` through `UnknownExercise`) means the submitted
/// routine tree is invalid, `WeekConflict` is the scheduling rule,
/// `Integrity` is a store-level constraint surfacing at commit, and `Db`
/// wraps everything infrastructural.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("student {0} not found")]
    StudentNotFound(Uuid),

    #[error("routine {0} not found")]
    RoutineNotFound(Uuid),

    #[error("assignment {0} not found")]
    AssignmentNotFound(Uuid),

    #[error("duplicate day number {0} in routine")]
    DuplicateDayNumber(i32),

    #[error("day number {0} is out of range (must be between 1 and 7)")]
    DayNumberOutOfRange(i32),

    #[error("duplicate sort order {sort_order} on day {day_number}")]
    DuplicateSortOrder { day_number: i32, sort_order: i32 },

    #[error("exercise {0} does not exist")]
    UnknownExercise(Uuid),

    #[error("student already has an active assignment in the week of {week_start} to {week_end}")]
    WeekConflict {
        week_start: NaiveDate,
        week_end: NaiveDate,
    },

    #[error("conflicts with existing data: {0}")]
    Integrity(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Wrap a database error, promoting constraint violations to
    /// [`CoreError::Integrity`].
    ///
    /// Used on statements where a unique or foreign-key constraint can fire
    /// legitimately (e.g. a duplicate routine name at commit), so callers can
    /// report a conflict instead of an internal failure.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = err {
            match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return Self::Integrity(db.message().to_owned());
                }
                _ => {}
            }
        }
        Self::Db(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = CoreError::DuplicateDayNumber(3);
        assert!(err.to_string().contains('3'));

        let err = CoreError::DuplicateSortOrder {
            day_number: 2,
            sort_order: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("day 2"), "unexpected message: {msg}");
        assert!(msg.contains("sort order 5"), "unexpected message: {msg}");
    }

    #[test]
    fn week_conflict_names_both_bounds() {
        let err = CoreError::WeekConflict {
            week_start: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            week_end: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2024-03-04"), "unexpected message: {msg}");
        assert!(msg.contains("2024-03-10"), "unexpected message: {msg}");
    }

    #[test]
    fn plain_db_errors_stay_db() {
        let err = CoreError::from_db(sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::Db(_)));
    }
}
