//! Database query functions for the `routines`, `routine_days`, and
//! `routine_day_exercises` tables.
//!
//! Tree creation and replacement are transactional operations owned by
//! `quiver_core::composer`; this module covers row-level reads and deletes.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Routine, RoutineDay, RoutineDayExercise};

/// Fetch a routine by its ID.
pub async fn get_routine(pool: &PgPool, id: Uuid) -> Result<Option<Routine>> {
    let routine = sqlx::query_as::<_, Routine>("SELECT * FROM routines WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch routine")?;

    Ok(routine)
}

/// List all routines ordered by name.
pub async fn list_routines(pool: &PgPool) -> Result<Vec<Routine>> {
    let routines = sqlx::query_as::<_, Routine>("SELECT * FROM routines ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("failed to list routines")?;

    Ok(routines)
}

/// List the days of a routine ordered by day number.
pub async fn list_days_for_routine(pool: &PgPool, routine_id: Uuid) -> Result<Vec<RoutineDay>> {
    let days = sqlx::query_as::<_, RoutineDay>(
        "SELECT * FROM routine_days WHERE routine_id = $1 ORDER BY day_number ASC",
    )
    .bind(routine_id)
    .fetch_all(pool)
    .await
    .context("failed to list routine days")?;

    Ok(days)
}

/// List the exercise slots for a set of days, ordered by day then sort order.
pub async fn list_exercises_for_days(
    pool: &PgPool,
    day_ids: &[Uuid],
) -> Result<Vec<RoutineDayExercise>> {
    let slots = sqlx::query_as::<_, RoutineDayExercise>(
        "SELECT * FROM routine_day_exercises \
         WHERE routine_day_id = ANY($1) \
         ORDER BY routine_day_id, sort_order ASC",
    )
    .bind(day_ids)
    .fetch_all(pool)
    .await
    .context("failed to list routine day exercises")?;

    Ok(slots)
}

/// Count the assignments still referencing a routine.
pub async fn count_assignments_for_routine(pool: &PgPool, routine_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM student_routine_assignments WHERE routine_id = $1",
    )
    .bind(routine_id)
    .fetch_one(pool)
    .await
    .context("failed to count assignments for routine")?;

    Ok(row.0)
}

/// Delete a routine and (via cascade) its day tree. Returns `false` if the
/// routine does not exist.
///
/// Fails with a foreign-key violation while any assignment still references
/// the routine (`ON DELETE RESTRICT`).
pub async fn delete_routine(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM routines WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete routine")?;

    Ok(result.rows_affected() > 0)
}
