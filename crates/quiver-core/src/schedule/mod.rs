//! Assignment scheduling.
//!
//! Creates student routine assignments and enforces the one-active-routine
//! rule: a student may hold at most one active assignment whose date range
//! touches a given ISO week (Monday through Sunday). Assignments with open
//! start or end dates are treated as unbounded on that side.

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use quiver_db::models::{Assignment, AssignmentStatus};
use quiver_db::queries::assignments as assignment_queries;

use crate::error::CoreError;

/// A new assignment submission. `status` defaults to active; only active
/// assignments participate in the weekly conflict check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub student_id: Uuid,
    pub routine_id: Uuid,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AssignmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The Monday and Sunday of the ISO week containing `date`.
pub fn overlap_week(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Days::new(6))
}

/// Create an assignment, rejecting it when the student already has an active
/// assignment overlapping the week of the new assignment's start date (or of
/// today, when no start date is given).
///
/// Referenced student and routine are verified inside the same transaction as
/// the insert, so a concurrent delete cannot leave a dangling assignment.
pub async fn create_assignment(
    pool: &PgPool,
    input: &NewAssignment,
) -> Result<Assignment, CoreError> {
    let mut tx = pool.begin().await?;

    let (student_exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(input.student_id)
            .fetch_one(&mut *tx)
            .await?;
    if !student_exists {
        return Err(CoreError::StudentNotFound(input.student_id));
    }

    let (routine_exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM routines WHERE id = $1)")
            .bind(input.routine_id)
            .fetch_one(&mut *tx)
            .await?;
    if !routine_exists {
        return Err(CoreError::RoutineNotFound(input.routine_id));
    }

    if input.status == AssignmentStatus::Active {
        let anchor = input.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let (week_start, week_end) = overlap_week(anchor);

        // An existing range [start, end] touches the week when start is on or
        // before the week's Sunday and end is on or after its Monday; a NULL
        // bound is unbounded on that side.
        let (conflict,): (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
                SELECT 1 FROM student_routine_assignments \
                WHERE student_id = $1 \
                  AND status = 'active' \
                  AND (start_date IS NULL OR start_date <= $3) \
                  AND (end_date IS NULL OR end_date >= $2) \
            )",
        )
        .bind(input.student_id)
        .bind(week_start)
        .bind(week_end)
        .fetch_one(&mut *tx)
        .await?;

        if conflict {
            return Err(CoreError::WeekConflict {
                week_start,
                week_end,
            });
        }
    }

    let assignment = sqlx::query_as::<_, Assignment>(
        "INSERT INTO student_routine_assignments \
         (student_id, routine_id, start_date, end_date, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(input.student_id)
    .bind(input.routine_id)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.status)
    .bind(&input.notes)
    .fetch_one(&mut *tx)
    .await
    .map_err(CoreError::from_db)?;

    tx.commit().await?;

    Ok(assignment)
}

/// Update an assignment's status.
///
/// Status changes never re-run the weekly conflict check: pausing and
/// resuming an assignment is a coaching decision, and an overlap introduced
/// by resuming is accepted rather than blocked.
pub async fn set_assignment_status(
    pool: &PgPool,
    id: Uuid,
    status: AssignmentStatus,
) -> Result<Assignment, CoreError> {
    assignment_queries::update_assignment_status(pool, id, status)
        .await?
        .ok_or(CoreError::AssignmentNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_maps_to_itself() {
        // 2024-03-04 is a Monday.
        let (start, end) = overlap_week(date(2024, 3, 4));
        assert_eq!(start, date(2024, 3, 4));
        assert_eq!(end, date(2024, 3, 10));
    }

    #[test]
    fn sunday_maps_to_preceding_monday() {
        // 2024-03-10 is a Sunday.
        let (start, end) = overlap_week(date(2024, 3, 10));
        assert_eq!(start, date(2024, 3, 4));
        assert_eq!(end, date(2024, 3, 10));
    }

    #[test]
    fn midweek_maps_to_surrounding_week() {
        // 2024-03-07 is a Thursday.
        let (start, end) = overlap_week(date(2024, 3, 7));
        assert_eq!(start, date(2024, 3, 4));
        assert_eq!(end, date(2024, 3, 10));
    }

    #[test]
    fn week_can_span_a_month_boundary() {
        // 2024-03-01 is a Friday; its week starts in February.
        let (start, end) = overlap_week(date(2024, 3, 1));
        assert_eq!(start, date(2024, 2, 26));
        assert_eq!(end, date(2024, 3, 3));
    }

    #[test]
    fn week_can_span_a_year_boundary() {
        // 2025-01-01 is a Wednesday; its week starts in December 2024.
        let (start, end) = overlap_week(date(2025, 1, 1));
        assert_eq!(start, date(2024, 12, 30));
        assert_eq!(end, date(2025, 1, 5));
    }
}
