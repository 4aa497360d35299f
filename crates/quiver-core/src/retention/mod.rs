//! Retention sweeps.
//!
//! Two independent policies keep the database from accumulating stale rows:
//!
//! * students who have been inactive longer than a grace period are deleted
//!   (their assignments go with them via cascade);
//! * non-template routines whose assignments have all ended are deleted,
//!   expired assignments first, then any non-template routine left without
//!   assignments, both steps in one transaction.
//!
//! The sweeps run from the background task in `quiver serve` and from the
//! `quiver maintain` command.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::error::CoreError;

/// Days a student may remain inactive before the purge removes them.
pub const INACTIVE_PURGE_DAYS: i64 = 30;

/// Delete inactive students whose `inactive_since` is older than `days` days.
/// Returns the number of students removed.
pub async fn purge_inactive_students(pool: &PgPool, days: i64) -> Result<u64, CoreError> {
    let cutoff = Utc::now() - Duration::days(days);

    let result = sqlx::query(
        "DELETE FROM students \
         WHERE is_active = FALSE \
           AND inactive_since IS NOT NULL \
           AND inactive_since <= $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Outcome of one temporary-routine sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutineSweep {
    pub assignments_deleted: u64,
    pub routines_deleted: u64,
}

/// Delete expired assignments of non-template routines, then any non-template
/// routine left with no assignments at all.
///
/// Both deletes run in one transaction, so a routine whose last assignment
/// expired is removed by the same sweep that removes the assignment.
pub async fn purge_expired_temporary_routines(pool: &PgPool) -> Result<RoutineSweep, CoreError> {
    let today = Utc::now().date_naive();

    let mut tx = pool.begin().await?;

    let assignments_deleted = sqlx::query(
        "DELETE FROM student_routine_assignments a \
         USING routines r \
         WHERE a.routine_id = r.id \
           AND r.is_template = FALSE \
           AND a.end_date IS NOT NULL \
           AND a.end_date < $1",
    )
    .bind(today)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let routines_deleted = sqlx::query(
        "DELETE FROM routines r \
         WHERE r.is_template = FALSE \
           AND NOT EXISTS ( \
               SELECT 1 FROM student_routine_assignments a WHERE a.routine_id = r.id \
           )",
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    Ok(RoutineSweep {
        assignments_deleted,
        routines_deleted,
    })
}

/// Outcome of one full maintenance pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceReport {
    pub students_purged: u64,
    pub sweep: RoutineSweep,
}

/// Run both retention sweeps and log what was removed.
pub async fn run_maintenance(
    pool: &PgPool,
    inactive_days: i64,
) -> Result<MaintenanceReport, CoreError> {
    let students_purged = purge_inactive_students(pool, inactive_days).await?;
    let sweep = purge_expired_temporary_routines(pool).await?;

    if students_purged > 0 || sweep.assignments_deleted > 0 || sweep.routines_deleted > 0 {
        info!(
            students = students_purged,
            assignments = sweep.assignments_deleted,
            routines = sweep.routines_deleted,
            "retention sweep removed rows"
        );
    }

    Ok(MaintenanceReport {
        students_purged,
        sweep,
    })
}
