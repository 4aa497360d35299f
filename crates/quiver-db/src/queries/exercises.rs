//! Database query functions for the `exercises` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Exercise;

/// Fields for inserting or fully updating an exercise.
#[derive(Debug, Clone)]
pub struct ExerciseInput<'a> {
    pub name: &'a str,
    pub arrows_count: i32,
    pub distance_m: f64,
    pub description: Option<&'a str>,
    pub is_active: bool,
}

/// Insert a new exercise row. Returns the inserted exercise with
/// server-generated defaults (id, timestamps).
pub async fn insert_exercise(pool: &PgPool, input: &ExerciseInput<'_>) -> Result<Exercise> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "INSERT INTO exercises (name, arrows_count, distance_m, description, is_active) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(input.name)
    .bind(input.arrows_count)
    .bind(input.distance_m)
    .bind(input.description)
    .bind(input.is_active)
    .fetch_one(pool)
    .await
    .context("failed to insert exercise")?;

    Ok(exercise)
}

/// Fetch an exercise by its ID.
pub async fn get_exercise(pool: &PgPool, id: Uuid) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>("SELECT * FROM exercises WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch exercise")?;

    Ok(exercise)
}

/// List exercises ordered by name.
pub async fn list_exercises(pool: &PgPool, only_active: bool) -> Result<Vec<Exercise>> {
    let sql = if only_active {
        "SELECT * FROM exercises WHERE is_active = TRUE ORDER BY name ASC"
    } else {
        "SELECT * FROM exercises ORDER BY name ASC"
    };
    let exercises = sqlx::query_as::<_, Exercise>(sql)
        .fetch_all(pool)
        .await
        .context("failed to list exercises")?;

    Ok(exercises)
}

/// Fully update an exercise. Returns `None` if the exercise does not exist.
pub async fn update_exercise(
    pool: &PgPool,
    id: Uuid,
    input: &ExerciseInput<'_>,
) -> Result<Option<Exercise>> {
    let exercise = sqlx::query_as::<_, Exercise>(
        "UPDATE exercises \
         SET name = $1, arrows_count = $2, distance_m = $3, description = $4, \
             is_active = $5, updated_at = now() \
         WHERE id = $6 \
         RETURNING *",
    )
    .bind(input.name)
    .bind(input.arrows_count)
    .bind(input.distance_m)
    .bind(input.description)
    .bind(input.is_active)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update exercise")?;

    Ok(exercise)
}

/// Delete an exercise. Returns `false` if the exercise does not exist.
///
/// Fails with a foreign-key violation while any routine day still references
/// the exercise (`ON DELETE RESTRICT`).
pub async fn delete_exercise(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete exercise")?;

    Ok(result.rows_affected() > 0)
}
