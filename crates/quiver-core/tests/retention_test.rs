//! Integration tests for the retention sweeps.
//!
//! `inactive_since` timestamps are backdated with direct UPDATEs so the
//! cutoff logic can be tested without waiting out the grace period.

use chrono::{Days, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use quiver_core::composer::{RoutineSpec, create_routine};
use quiver_core::retention::{
    RoutineSweep, purge_expired_temporary_routines, purge_inactive_students, run_maintenance,
};
use quiver_core::schedule::{NewAssignment, create_assignment};
use quiver_db::models::AssignmentStatus;
use quiver_db::queries::students::{self, NewStudent};
use quiver_test_utils::{create_test_db, drop_test_db};

async fn seed_student(pool: &PgPool, name: &str, document: &str) -> Uuid {
    let new = NewStudent {
        full_name: name,
        document_number: document,
        contact: None,
        bow_pounds: None,
        arrows_available: None,
    };
    students::insert_student(pool, &new)
        .await
        .expect("insert_student should succeed")
        .id
}

async fn seed_routine(pool: &PgPool, name: &str, is_template: bool) -> Uuid {
    let spec = RoutineSpec {
        name: name.to_string(),
        description: None,
        is_active: true,
        is_template,
        days: vec![],
    };
    create_routine(pool, &spec)
        .await
        .expect("create_routine should succeed")
        .routine
        .id
}

/// Deactivate a student and pretend it happened `days` days ago.
async fn deactivate_days_ago(pool: &PgPool, student_id: Uuid, days: i64) {
    students::set_student_active(pool, student_id, false)
        .await
        .expect("set_student_active should succeed")
        .expect("student should exist");

    let stamp = Utc::now() - Duration::days(days);
    sqlx::query("UPDATE students SET inactive_since = $1 WHERE id = $2")
        .bind(stamp)
        .bind(student_id)
        .execute(pool)
        .await
        .expect("backdating should succeed");
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let query = format!("SELECT COUNT(*) FROM {table}");
    let row: (i64,) = sqlx::query_as(&query)
        .fetch_one(pool)
        .await
        .expect("count should succeed");
    row.0
}

#[tokio::test]
async fn purge_removes_only_students_past_the_cutoff() {
    let (pool, db_name) = create_test_db().await;

    let long_gone = seed_student(&pool, "Ana Silva", "DOC-1").await;
    let recent = seed_student(&pool, "Bea Costa", "DOC-2").await;
    seed_student(&pool, "Cora Dias", "DOC-3").await;

    deactivate_days_ago(&pool, long_gone, 31).await;
    deactivate_days_ago(&pool, recent, 29).await;

    let purged = purge_inactive_students(&pool, 30)
        .await
        .expect("purge should succeed");
    assert_eq!(purged, 1, "only the 31-day student crosses the cutoff");
    assert_eq!(count(&pool, "students").await, 2);

    // Running again finds nothing new.
    let purged = purge_inactive_students(&pool, 30)
        .await
        .expect("second purge should succeed");
    assert_eq!(purged, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn active_students_are_never_purged() {
    let (pool, db_name) = create_test_db().await;
    seed_student(&pool, "Ana Silva", "DOC-1").await;

    // Even with a zero-day grace period an active student stays.
    let purged = purge_inactive_students(&pool, 0)
        .await
        .expect("purge should succeed");
    assert_eq!(purged, 0);
    assert_eq!(count(&pool, "students").await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn purged_students_take_their_assignments_along() {
    let (pool, db_name) = create_test_db().await;
    let student = seed_student(&pool, "Ana Silva", "DOC-1").await;
    let routine = seed_routine(&pool, "Base week", true).await;

    let new = NewAssignment {
        student_id: student,
        routine_id: routine,
        start_date: None,
        end_date: None,
        status: AssignmentStatus::Active,
        notes: None,
    };
    create_assignment(&pool, &new)
        .await
        .expect("assignment should succeed");

    deactivate_days_ago(&pool, student, 40).await;

    let purged = purge_inactive_students(&pool, 30)
        .await
        .expect("purge should succeed");
    assert_eq!(purged, 1);
    assert_eq!(count(&pool, "student_routine_assignments").await, 0);
    assert_eq!(count(&pool, "routines").await, 1, "the routine is untouched");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn expired_assignment_and_its_temp_routine_go_in_one_pass() {
    let (pool, db_name) = create_test_db().await;
    let student = seed_student(&pool, "Ana Silva", "DOC-1").await;
    let temp = seed_routine(&pool, "One-off plan", false).await;

    let today = Utc::now().date_naive();
    let new = NewAssignment {
        student_id: student,
        routine_id: temp,
        start_date: Some(today - Days::new(10)),
        end_date: Some(today - Days::new(1)),
        status: AssignmentStatus::Active,
        notes: None,
    };
    create_assignment(&pool, &new)
        .await
        .expect("assignment should succeed");

    let sweep = purge_expired_temporary_routines(&pool)
        .await
        .expect("sweep should succeed");
    assert_eq!(
        sweep,
        RoutineSweep {
            assignments_deleted: 1,
            routines_deleted: 1,
        },
        "one sweep removes the expired assignment and the routine it freed"
    );
    assert_eq!(count(&pool, "routines").await, 0);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn template_routines_survive_expired_assignments() {
    let (pool, db_name) = create_test_db().await;
    let student = seed_student(&pool, "Ana Silva", "DOC-1").await;
    let template = seed_routine(&pool, "Base week", true).await;

    let today = Utc::now().date_naive();
    let new = NewAssignment {
        student_id: student,
        routine_id: template,
        start_date: Some(today - Days::new(10)),
        end_date: Some(today - Days::new(1)),
        status: AssignmentStatus::Active,
        notes: None,
    };
    create_assignment(&pool, &new)
        .await
        .expect("assignment should succeed");

    let sweep = purge_expired_temporary_routines(&pool)
        .await
        .expect("sweep should succeed");
    assert_eq!(sweep, RoutineSweep::default(), "templates are off limits");
    assert_eq!(count(&pool, "student_routine_assignments").await, 1);
    assert_eq!(count(&pool, "routines").await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unassigned_temp_routine_is_removed() {
    let (pool, db_name) = create_test_db().await;
    seed_routine(&pool, "Orphan plan", false).await;
    seed_routine(&pool, "Base week", true).await;

    let sweep = purge_expired_temporary_routines(&pool)
        .await
        .expect("sweep should succeed");
    assert_eq!(sweep.assignments_deleted, 0);
    assert_eq!(sweep.routines_deleted, 1);
    assert_eq!(count(&pool, "routines").await, 1, "the template remains");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn running_and_open_ended_temp_assignments_are_kept() {
    let (pool, db_name) = create_test_db().await;
    let ana = seed_student(&pool, "Ana Silva", "DOC-1").await;
    let bea = seed_student(&pool, "Bea Costa", "DOC-2").await;
    let running = seed_routine(&pool, "Running plan", false).await;
    let open_ended = seed_routine(&pool, "Open plan", false).await;

    let today = Utc::now().date_naive();
    let future = NewAssignment {
        student_id: ana,
        routine_id: running,
        start_date: Some(today),
        end_date: Some(today + Days::new(7)),
        status: AssignmentStatus::Active,
        notes: None,
    };
    create_assignment(&pool, &future)
        .await
        .expect("assignment should succeed");

    let unbounded = NewAssignment {
        student_id: bea,
        routine_id: open_ended,
        start_date: Some(today),
        end_date: None,
        status: AssignmentStatus::Active,
        notes: None,
    };
    create_assignment(&pool, &unbounded)
        .await
        .expect("assignment should succeed");

    let sweep = purge_expired_temporary_routines(&pool)
        .await
        .expect("sweep should succeed");
    assert_eq!(sweep, RoutineSweep::default());
    assert_eq!(count(&pool, "routines").await, 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn run_maintenance_reports_both_sweeps() {
    let (pool, db_name) = create_test_db().await;

    let student = seed_student(&pool, "Ana Silva", "DOC-1").await;
    deactivate_days_ago(&pool, student, 45).await;
    seed_routine(&pool, "Orphan plan", false).await;

    let report = run_maintenance(&pool, 30)
        .await
        .expect("maintenance should succeed");
    assert_eq!(report.students_purged, 1);
    assert_eq!(report.sweep.assignments_deleted, 0);
    assert_eq!(report.sweep.routines_deleted, 1);

    // A second pass is a no-op.
    let report = run_maintenance(&pool, 30)
        .await
        .expect("second maintenance should succeed");
    assert_eq!(report.students_purged, 0);
    assert_eq!(report.sweep, RoutineSweep::default());

    pool.close().await;
    drop_test_db(&db_name).await;
}
