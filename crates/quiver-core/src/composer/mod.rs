//! Routine composition.
//!
//! Builds and replaces routine trees (routine -> days -> exercise slots) from
//! a submitted [`RoutineSpec`], inserting all rows within a single database
//! transaction so a routine is never visible in a half-written state.
//!
//! Validation runs in a fixed order: day numbers first, then referenced
//! exercises, then sort orders. The first failed stage wins, so a submission
//! with several problems always reports the earliest one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use quiver_db::models::{Routine, RoutineDay, RoutineDayExercise};
use quiver_db::queries::routines as routine_queries;

use crate::error::CoreError;

/// A full routine submission: the routine row plus every day and exercise
/// slot. Replacement submissions carry the same shape; the previous tree is
/// discarded wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_template: bool,
    #[serde(default)]
    pub days: Vec<DaySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySpec {
    pub day_number: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<DayExerciseSpec>,
}

/// One exercise slot within a day. `sort_order` may be omitted, in which case
/// the slot takes its 1-based position within the submitted day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayExerciseSpec {
    pub exercise_id: Uuid,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub arrows_override: Option<i32>,
    #[serde(default)]
    pub distance_override_m: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A routine loaded with its full tree, days ordered by `day_number` and
/// slots within each day ordered by `sort_order`.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineTree {
    #[serde(flatten)]
    pub routine: Routine,
    pub days: Vec<DayTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTree {
    #[serde(flatten)]
    pub day: RoutineDay,
    pub exercises: Vec<RoutineDayExercise>,
}

/// Create a routine and its full tree, returning the reloaded result.
pub async fn create_routine(pool: &PgPool, spec: &RoutineSpec) -> Result<RoutineTree, CoreError> {
    validate_day_numbers(&spec.days)?;

    let mut tx = pool.begin().await?;

    ensure_exercises_exist(&mut tx, &spec.days).await?;
    let orders = resolve_all_sort_orders(&spec.days)?;

    let routine = sqlx::query_as::<_, Routine>(
        "INSERT INTO routines (name, description, is_active, is_template) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&spec.name)
    .bind(&spec.description)
    .bind(spec.is_active)
    .bind(spec.is_template)
    .fetch_one(&mut *tx)
    .await
    .map_err(CoreError::from_db)?;

    insert_day_tree(&mut tx, routine.id, &spec.days, &orders).await?;

    tx.commit().await?;

    reload_tree(pool, routine.id).await
}

/// Replace a routine's row and entire tree with the submitted spec. The old
/// days and slots are deleted and rebuilt inside one transaction; validation
/// failures leave the stored tree untouched.
pub async fn replace_routine_tree(
    pool: &PgPool,
    routine_id: Uuid,
    spec: &RoutineSpec,
) -> Result<RoutineTree, CoreError> {
    validate_day_numbers(&spec.days)?;

    let mut tx = pool.begin().await?;

    ensure_exercises_exist(&mut tx, &spec.days).await?;
    let orders = resolve_all_sort_orders(&spec.days)?;

    let routine = sqlx::query_as::<_, Routine>(
        "UPDATE routines \
         SET name = $2, description = $3, is_active = $4, is_template = $5, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(routine_id)
    .bind(&spec.name)
    .bind(&spec.description)
    .bind(spec.is_active)
    .bind(spec.is_template)
    .fetch_optional(&mut *tx)
    .await
    .map_err(CoreError::from_db)?
    .ok_or(CoreError::RoutineNotFound(routine_id))?;

    // Dropping the old days cascades to their exercise slots, and the delete
    // is visible to the inserts below, so resubmitted day numbers do not trip
    // the uniqueness constraint.
    sqlx::query("DELETE FROM routine_days WHERE routine_id = $1")
        .bind(routine_id)
        .execute(&mut *tx)
        .await?;

    insert_day_tree(&mut tx, routine.id, &spec.days, &orders).await?;

    tx.commit().await?;

    reload_tree(pool, routine_id).await
}

/// Load one routine with its full tree. Returns `Ok(None)` when the routine
/// does not exist.
pub async fn load_routine_tree(
    pool: &PgPool,
    routine_id: Uuid,
) -> Result<Option<RoutineTree>, CoreError> {
    let Some(routine) = routine_queries::get_routine(pool, routine_id).await? else {
        return Ok(None);
    };

    let days = routine_queries::list_days_for_routine(pool, routine_id).await?;
    let day_ids: Vec<Uuid> = days.iter().map(|d| d.id).collect();
    let mut slots = group_slots_by_day(routine_queries::list_exercises_for_days(pool, &day_ids).await?);

    let days = days
        .into_iter()
        .map(|day| {
            let exercises = slots.remove(&day.id).unwrap_or_default();
            DayTree { day, exercises }
        })
        .collect();

    Ok(Some(RoutineTree { routine, days }))
}

/// Load every routine with its tree, ordered by routine name. Day and slot
/// rows for all routines are fetched in two batched queries rather than one
/// round trip per routine.
pub async fn list_routine_trees(pool: &PgPool) -> Result<Vec<RoutineTree>, CoreError> {
    let routines = routine_queries::list_routines(pool).await?;

    let all_days: Vec<RoutineDay> = sqlx::query_as(
        "SELECT * FROM routine_days WHERE routine_id = ANY($1) ORDER BY day_number ASC",
    )
    .bind(routines.iter().map(|r| r.id).collect::<Vec<Uuid>>())
    .fetch_all(pool)
    .await?;

    let day_ids: Vec<Uuid> = all_days.iter().map(|d| d.id).collect();
    let mut slots = group_slots_by_day(routine_queries::list_exercises_for_days(pool, &day_ids).await?);

    let mut days_by_routine: HashMap<Uuid, Vec<DayTree>> = HashMap::new();
    for day in all_days {
        let exercises = slots.remove(&day.id).unwrap_or_default();
        days_by_routine
            .entry(day.routine_id)
            .or_default()
            .push(DayTree { day, exercises });
    }

    Ok(routines
        .into_iter()
        .map(|routine| {
            let days = days_by_routine.remove(&routine.id).unwrap_or_default();
            RoutineTree { routine, days }
        })
        .collect())
}

async fn reload_tree(pool: &PgPool, routine_id: Uuid) -> Result<RoutineTree, CoreError> {
    load_routine_tree(pool, routine_id)
        .await?
        .ok_or(CoreError::RoutineNotFound(routine_id))
}

fn group_slots_by_day(slots: Vec<RoutineDayExercise>) -> HashMap<Uuid, Vec<RoutineDayExercise>> {
    let mut by_day: HashMap<Uuid, Vec<RoutineDayExercise>> = HashMap::new();
    for slot in slots {
        by_day.entry(slot.routine_day_id).or_default().push(slot);
    }
    by_day
}

/// Stage 1: every day number must lie in 1..=7 and appear at most once.
fn validate_day_numbers(days: &[DaySpec]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for day in days {
        if !(1..=7).contains(&day.day_number) {
            return Err(CoreError::DayNumberOutOfRange(day.day_number));
        }
        if !seen.insert(day.day_number) {
            return Err(CoreError::DuplicateDayNumber(day.day_number));
        }
    }
    Ok(())
}

/// Stage 2: every referenced exercise id must exist. The ids are checked with
/// one batched query; the first missing id in submission order is reported.
async fn ensure_exercises_exist(
    tx: &mut Transaction<'_, Postgres>,
    days: &[DaySpec],
) -> Result<(), CoreError> {
    let mut referenced: Vec<Uuid> = Vec::new();
    for day in days {
        for slot in &day.exercises {
            if !referenced.contains(&slot.exercise_id) {
                referenced.push(slot.exercise_id);
            }
        }
    }
    if referenced.is_empty() {
        return Ok(());
    }

    let known: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM exercises WHERE id = ANY($1)")
        .bind(&referenced)
        .fetch_all(&mut **tx)
        .await?;
    let known: HashSet<Uuid> = known.into_iter().map(|(id,)| id).collect();

    for id in &referenced {
        if !known.contains(id) {
            return Err(CoreError::UnknownExercise(*id));
        }
    }
    Ok(())
}

/// Stage 3: resolve each slot's sort order (explicit value, or 1-based
/// position within its day) and reject duplicates within a day. Returns the
/// resolved orders keyed by day number.
fn resolve_all_sort_orders(days: &[DaySpec]) -> Result<HashMap<i32, Vec<i32>>, CoreError> {
    let mut resolved = HashMap::new();
    for day in days {
        let mut seen = HashSet::new();
        let mut orders = Vec::with_capacity(day.exercises.len());
        for (position, slot) in day.exercises.iter().enumerate() {
            let order = slot.sort_order.unwrap_or(position as i32 + 1);
            if !seen.insert(order) {
                return Err(CoreError::DuplicateSortOrder {
                    day_number: day.day_number,
                    sort_order: order,
                });
            }
            orders.push(order);
        }
        resolved.insert(day.day_number, orders);
    }
    Ok(resolved)
}

/// Insert every day and slot of a validated spec. Days are inserted in
/// `day_number` order; slots keep their submission order and carry the
/// resolved sort orders from [`resolve_all_sort_orders`].
async fn insert_day_tree(
    tx: &mut Transaction<'_, Postgres>,
    routine_id: Uuid,
    days: &[DaySpec],
    orders: &HashMap<i32, Vec<i32>>,
) -> Result<(), CoreError> {
    let mut ordered: Vec<&DaySpec> = days.iter().collect();
    ordered.sort_by_key(|day| day.day_number);

    for day in ordered {
        let day_row = sqlx::query_as::<_, RoutineDay>(
            "INSERT INTO routine_days (routine_id, day_number, name, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(routine_id)
        .bind(day.day_number)
        .bind(&day.name)
        .bind(&day.notes)
        .fetch_one(&mut **tx)
        .await
        .map_err(CoreError::from_db)?;

        let day_orders = &orders[&day.day_number];
        for (slot, sort_order) in day.exercises.iter().zip(day_orders) {
            sqlx::query(
                "INSERT INTO routine_day_exercises \
                 (routine_day_id, exercise_id, sort_order, arrows_override, distance_override_m, notes) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(day_row.id)
            .bind(slot.exercise_id)
            .bind(sort_order)
            .bind(slot.arrows_override)
            .bind(slot.distance_override_m)
            .bind(&slot.notes)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::from_db)?;
        }
    }
    Ok(())
}
