//! Row-level CRUD tests for the query modules.
//!
//! Each test runs against its own temporary database from
//! `quiver-test-utils`.

use quiver_db::models::Role;
use quiver_db::queries::exercises::{self, ExerciseInput};
use quiver_db::queries::students::{self, NewStudent, StudentUpdate};
use quiver_db::queries::users;
use quiver_test_utils::{create_test_db, drop_test_db};

fn sample_exercise(name: &str) -> ExerciseInput<'_> {
    ExerciseInput {
        name,
        arrows_count: 30,
        distance_m: 18.0,
        description: Some("Form work at short distance"),
        is_active: true,
    }
}

fn sample_student<'a>(name: &'a str, document: &'a str) -> NewStudent<'a> {
    NewStudent {
        full_name: name,
        document_number: document,
        contact: Some("ana@example.com"),
        bow_pounds: Some(26.0),
        arrows_available: Some(120),
    }
}

#[tokio::test]
async fn exercise_crud_roundtrip() {
    let (pool, db_name) = create_test_db().await;

    let created = exercises::insert_exercise(&pool, &sample_exercise("Blank bale"))
        .await
        .expect("insert should succeed");
    assert_eq!(created.name, "Blank bale");
    assert!(created.is_active);

    let fetched = exercises::get_exercise(&pool, created.id)
        .await
        .expect("get should succeed")
        .expect("exercise should exist");
    assert_eq!(fetched.arrows_count, 30);

    // Deactivate via full update, then check the active-only listing.
    let update = ExerciseInput {
        is_active: false,
        ..sample_exercise("Blank bale (retired)")
    };
    let updated = exercises::update_exercise(&pool, created.id, &update)
        .await
        .expect("update should succeed")
        .expect("exercise should exist");
    assert_eq!(updated.name, "Blank bale (retired)");
    assert!(!updated.is_active);

    let all = exercises::list_exercises(&pool, false)
        .await
        .expect("list should succeed");
    assert_eq!(all.len(), 1);
    let active_only = exercises::list_exercises(&pool, true)
        .await
        .expect("list should succeed");
    assert!(active_only.is_empty());

    // Delete, then every lookup comes back empty.
    let deleted = exercises::delete_exercise(&pool, created.id)
        .await
        .expect("delete should succeed");
    assert!(deleted);
    let deleted_again = exercises::delete_exercise(&pool, created.id)
        .await
        .expect("second delete should succeed");
    assert!(!deleted_again, "second delete should report no rows");
    let gone = exercises::get_exercise(&pool, created.id)
        .await
        .expect("get should succeed");
    assert!(gone.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_document_number_is_rejected() {
    let (pool, db_name) = create_test_db().await;

    students::insert_student(&pool, &sample_student("Ana Silva", "DOC-1"))
        .await
        .expect("first insert should succeed");

    let result = students::insert_student(&pool, &sample_student("Ana Clone", "DOC-1")).await;
    assert!(result.is_err(), "duplicate document number must be rejected");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn student_active_flag_drives_inactive_since() {
    let (pool, db_name) = create_test_db().await;

    let student = students::insert_student(&pool, &sample_student("Ana Silva", "DOC-1"))
        .await
        .expect("insert should succeed");
    assert!(student.is_active);
    assert!(student.inactive_since.is_none());

    // Deactivating stamps the clock.
    let student = students::set_student_active(&pool, student.id, false)
        .await
        .expect("set_student_active should succeed")
        .expect("student should exist");
    assert!(!student.is_active);
    let first_stamp = student
        .inactive_since
        .expect("deactivation must set inactive_since");

    // A full update that keeps the student inactive preserves the original
    // timestamp instead of resetting it.
    let update = StudentUpdate {
        full_name: "Ana Silva",
        document_number: "DOC-1",
        contact: None,
        bow_pounds: Some(28.0),
        arrows_available: Some(90),
        is_active: false,
    };
    let student = students::update_student(&pool, student.id, &update)
        .await
        .expect("update should succeed")
        .expect("student should exist");
    assert_eq!(
        student.inactive_since,
        Some(first_stamp),
        "staying inactive must not move the clock"
    );

    // Reactivating clears it.
    let student = students::set_student_active(&pool, student.id, true)
        .await
        .expect("set_student_active should succeed")
        .expect("student should exist");
    assert!(student.is_active);
    assert!(student.inactive_since.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn student_updates_miss_unknown_ids() {
    let (pool, db_name) = create_test_db().await;

    let ghost = uuid::Uuid::new_v4();
    let update = StudentUpdate {
        full_name: "Nobody",
        document_number: "DOC-0",
        contact: None,
        bow_pounds: None,
        arrows_available: None,
        is_active: true,
    };
    let missing = students::update_student(&pool, ghost, &update)
        .await
        .expect("update should succeed");
    assert!(missing.is_none());

    let missing = students::set_student_active(&pool, ghost, false)
        .await
        .expect("set_student_active should succeed");
    assert!(missing.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn users_insert_and_lookup() {
    let (pool, db_name) = create_test_db().await;

    let user = users::insert_user(&pool, "ada", "$2b$12$notarealhash", Role::Coach)
        .await
        .expect("insert should succeed");
    assert_eq!(user.username, "ada");
    assert_eq!(user.role, Role::Coach);
    assert!(user.is_active);

    let found = users::get_user_by_username(&pool, "ada")
        .await
        .expect("lookup should succeed")
        .expect("user should exist");
    assert_eq!(found.id, user.id);

    let missing = users::get_user_by_username(&pool, "nobody")
        .await
        .expect("lookup should succeed");
    assert!(missing.is_none());

    // Usernames are unique.
    let duplicate = users::insert_user(&pool, "ada", "$2b$12$otherhash", Role::Admin).await;
    assert!(duplicate.is_err());

    let all = users::list_users(&pool).await.expect("list should succeed");
    assert_eq!(all.len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}
