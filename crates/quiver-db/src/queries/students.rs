//! Database query functions for the `students` table.
//!
//! Every mutation that touches `is_active` also maintains `inactive_since`
//! in the same statement, so the "non-null exactly while inactive" invariant
//! holds no matter which path changed the flag.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Student;

/// Fields for inserting a student. New students are always active.
#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub full_name: &'a str,
    pub document_number: &'a str,
    pub contact: Option<&'a str>,
    pub bow_pounds: Option<f64>,
    pub arrows_available: Option<i32>,
}

/// Fields for fully updating a student, including the active flag.
#[derive(Debug, Clone)]
pub struct StudentUpdate<'a> {
    pub full_name: &'a str,
    pub document_number: &'a str,
    pub contact: Option<&'a str>,
    pub bow_pounds: Option<f64>,
    pub arrows_available: Option<i32>,
    pub is_active: bool,
}

/// Insert a new student row. Returns the inserted student with
/// server-generated defaults (id, is_active, timestamps).
///
/// Fails with a unique violation when the document number is already taken.
pub async fn insert_student(pool: &PgPool, new: &NewStudent<'_>) -> Result<Student> {
    let student = sqlx::query_as::<_, Student>(
        "INSERT INTO students (full_name, document_number, contact, bow_pounds, arrows_available) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.full_name)
    .bind(new.document_number)
    .bind(new.contact)
    .bind(new.bow_pounds)
    .bind(new.arrows_available)
    .fetch_one(pool)
    .await
    .context("failed to insert student")?;

    Ok(student)
}

/// Fetch a student by its ID.
pub async fn get_student(pool: &PgPool, id: Uuid) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch student")?;

    Ok(student)
}

/// List students ordered by full name.
pub async fn list_students(pool: &PgPool, only_active: bool) -> Result<Vec<Student>> {
    let sql = if only_active {
        "SELECT * FROM students WHERE is_active = TRUE ORDER BY full_name ASC"
    } else {
        "SELECT * FROM students ORDER BY full_name ASC"
    };
    let students = sqlx::query_as::<_, Student>(sql)
        .fetch_all(pool)
        .await
        .context("failed to list students")?;

    Ok(students)
}

/// Fully update a student. Returns `None` if the student does not exist.
///
/// `inactive_since` follows `is_active` atomically: cleared when the student
/// is (re)activated, set on the first transition to inactive, and preserved
/// when the student was already inactive.
pub async fn update_student(
    pool: &PgPool,
    id: Uuid,
    update: &StudentUpdate<'_>,
) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
        "UPDATE students \
         SET full_name = $1, document_number = $2, contact = $3, bow_pounds = $4, \
             arrows_available = $5, is_active = $6, \
             inactive_since = CASE WHEN $6 THEN NULL ELSE COALESCE(inactive_since, now()) END, \
             updated_at = now() \
         WHERE id = $7 \
         RETURNING *",
    )
    .bind(update.full_name)
    .bind(update.document_number)
    .bind(update.contact)
    .bind(update.bow_pounds)
    .bind(update.arrows_available)
    .bind(update.is_active)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to update student")?;

    Ok(student)
}

/// Flip only the active flag. Returns `None` if the student does not exist.
///
/// Same `inactive_since` rules as [`update_student`].
pub async fn set_student_active(
    pool: &PgPool,
    id: Uuid,
    is_active: bool,
) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
        "UPDATE students \
         SET is_active = $1, \
             inactive_since = CASE WHEN $1 THEN NULL ELSE COALESCE(inactive_since, now()) END, \
             updated_at = now() \
         WHERE id = $2 \
         RETURNING *",
    )
    .bind(is_active)
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to set student active flag")?;

    Ok(student)
}
