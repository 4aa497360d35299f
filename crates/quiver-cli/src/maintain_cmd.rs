//! `quiver maintain` command: run the retention sweeps once.

use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use quiver_core::retention;
use quiver_db::schema;

/// Run the maintain command.
pub async fn run_maintain(pool: &PgPool, inactive_days: i64) -> Result<()> {
    // The sweeps read the retention columns; bring a pre-migration database
    // up to date before touching them.
    schema::ensure_retention_schema(pool).await?;

    let cutoff = Utc::now() - Duration::days(inactive_days);
    println!(
        "Purging students inactive since before {}...",
        cutoff.format("%Y-%m-%d")
    );

    let report = retention::run_maintenance(pool, inactive_days).await?;

    println!("  Students purged:       {}", report.students_purged);
    println!(
        "  Assignments expired:   {}",
        report.sweep.assignments_deleted
    );
    println!(
        "  Temp routines removed: {}",
        report.sweep.routines_deleted
    );
    println!("\nMaintenance complete.");

    Ok(())
}
