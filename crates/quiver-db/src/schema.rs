//! Schema guard for databases that predate the retention columns.
//!
//! Early deployments shipped without `routines.is_template` and
//! `students.inactive_since`, and the retention sweeps cannot run without
//! them. [`ensure_retention_schema`] introspects the catalog and upgrades
//! such a database in place: add the missing columns with safe defaults,
//! create the supporting indexes, and backfill `inactive_since` for rows
//! that were already inactive. Everything happens inside one transaction,
//! so a database is never left with a column added but not backfilled.
//!
//! The function is idempotent and cheap when the schema is already current;
//! it runs at `quiver serve` startup and during `quiver db-init`.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use tracing::info;

/// What [`ensure_retention_schema`] changed. All-false on an up-to-date
/// database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub added_is_template: bool,
    pub added_inactive_since: bool,
    pub created_template_index: bool,
    pub created_inactive_index: bool,
    pub backfilled_students: u64,
}

impl SchemaReport {
    /// True when the guard had nothing to do.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Verify and, if needed, upgrade the retention-related schema.
///
/// Runs entirely within a single transaction: either every missing column,
/// index, and backfill lands together, or none of them do. Callers treat a
/// failure here as fatal.
pub async fn ensure_retention_schema(pool: &PgPool) -> Result<SchemaReport> {
    let mut tx = pool
        .begin()
        .await
        .context("failed to begin schema guard transaction")?;

    let mut report = SchemaReport::default();

    // routines.is_template -- default TRUE so pre-existing routines are
    // treated as durable templates, never as purgeable temporaries.
    if !column_exists(&mut tx, "routines", "is_template").await? {
        sqlx::query("ALTER TABLE routines ADD COLUMN is_template BOOLEAN NOT NULL DEFAULT TRUE")
            .execute(&mut *tx)
            .await
            .context("failed to add routines.is_template")?;
        report.added_is_template = true;
    }

    // students.inactive_since -- nullable; backfilled below for rows that
    // are already inactive.
    if !column_exists(&mut tx, "students", "inactive_since").await? {
        sqlx::query("ALTER TABLE students ADD COLUMN inactive_since TIMESTAMPTZ")
            .execute(&mut *tx)
            .await
            .context("failed to add students.inactive_since")?;
        report.added_inactive_since = true;
    }

    if !index_exists(&mut tx, "routines", "idx_routines_template_active").await? {
        sqlx::query(
            "CREATE INDEX idx_routines_template_active ON routines (is_template, is_active)",
        )
        .execute(&mut *tx)
        .await
        .context("failed to create idx_routines_template_active")?;
        report.created_template_index = true;
    }

    if !index_exists(&mut tx, "students", "idx_students_inactive_since").await? {
        sqlx::query(
            "CREATE INDEX idx_students_inactive_since ON students (is_active, inactive_since)",
        )
        .execute(&mut *tx)
        .await
        .context("failed to create idx_students_inactive_since")?;
        report.created_inactive_index = true;
    }

    // Backfill: an inactive student with no timestamp gets the best available
    // approximation of when they went inactive.
    let backfilled = sqlx::query(
        "UPDATE students \
         SET inactive_since = COALESCE(updated_at, created_at, now()) \
         WHERE is_active = FALSE AND inactive_since IS NULL",
    )
    .execute(&mut *tx)
    .await
    .context("failed to backfill students.inactive_since")?;
    report.backfilled_students = backfilled.rows_affected();

    tx.commit()
        .await
        .context("failed to commit schema guard transaction")?;

    if report.is_noop() {
        info!("retention schema is up to date");
    } else {
        info!(
            added_is_template = report.added_is_template,
            added_inactive_since = report.added_inactive_since,
            backfilled_students = report.backfilled_students,
            "retention schema upgraded"
        );
    }

    Ok(report)
}

/// Check `information_schema.columns` for a column on a public-schema table.
async fn column_exists(conn: &mut PgConnection, table: &str, column: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS( \
            SELECT 1 FROM information_schema.columns \
            WHERE table_schema = 'public' \
              AND table_name = $1 \
              AND column_name = $2)",
    )
    .bind(table)
    .bind(column)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to check for column {table}.{column}"))?;

    Ok(exists)
}

/// Check `pg_indexes` for an index on a public-schema table.
async fn index_exists(conn: &mut PgConnection, table: &str, index: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS( \
            SELECT 1 FROM pg_indexes \
            WHERE schemaname = 'public' \
              AND tablename = $1 \
              AND indexname = $2)",
    )
    .bind(table)
    .bind(index)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to check for index {index} on {table}"))?;

    Ok(exists)
}
