//! Database query functions for the `student_routine_assignments` table.
//!
//! Assignment creation runs through `quiver_core::schedule` (it needs the
//! weekly-overlap check); this module covers reads, status updates, and
//! deletes. Status updates are deliberately direct: reactivating a paused
//! assignment does not re-run the overlap check.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Assignment, AssignmentStatus};

/// Fetch an assignment by its ID.
pub async fn get_assignment(pool: &PgPool, id: Uuid) -> Result<Option<Assignment>> {
    let assignment =
        sqlx::query_as::<_, Assignment>("SELECT * FROM student_routine_assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch assignment")?;

    Ok(assignment)
}

/// List all assignments, newest first.
pub async fn list_assignments(pool: &PgPool) -> Result<Vec<Assignment>> {
    let assignments = sqlx::query_as::<_, Assignment>(
        "SELECT * FROM student_routine_assignments ORDER BY assigned_at DESC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list assignments")?;

    Ok(assignments)
}

/// List a student's assignments, newest first.
pub async fn list_assignments_for_student(
    pool: &PgPool,
    student_id: Uuid,
) -> Result<Vec<Assignment>> {
    let assignments = sqlx::query_as::<_, Assignment>(
        "SELECT * FROM student_routine_assignments \
         WHERE student_id = $1 \
         ORDER BY assigned_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .context("failed to list assignments for student")?;

    Ok(assignments)
}

/// Update an assignment's status. Returns `None` if the assignment does not
/// exist.
pub async fn update_assignment_status(
    pool: &PgPool,
    id: Uuid,
    status: AssignmentStatus,
) -> Result<Option<Assignment>> {
    let assignment = sqlx::query_as::<_, Assignment>(
        "UPDATE student_routine_assignments \
         SET status = $1, updated_at = now() \
         WHERE id = $2 \
         RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update assignment status")?;

    Ok(assignment)
}

/// Delete an assignment. Returns `false` if the assignment does not exist.
pub async fn delete_assignment(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM student_routine_assignments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete assignment")?;

    Ok(result.rows_affected() > 0)
}
