//! Routine endpoints.
//!
//! Routines are read and written as whole trees (routine, days, exercise
//! slots); `PUT` replaces the stored tree outright. Structural validation
//! (day numbers, referenced exercises, sort orders) lives in the composer;
//! this module only checks the primitive field ranges.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use quiver_core::composer::{self, RoutineSpec};
use quiver_db::queries::routines as routine_queries;

use super::auth::AuthUser;
use super::{AppError, AppState};

fn validate(spec: &RoutineSpec) -> Result<(), AppError> {
    if spec.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be blank"));
    }
    for day in &spec.days {
        for slot in &day.exercises {
            if let Some(order) = slot.sort_order {
                if order < 1 {
                    return Err(AppError::bad_request(format!(
                        "sort_order must be at least 1 (day {})",
                        day.day_number
                    )));
                }
            }
            if let Some(arrows) = slot.arrows_override {
                if arrows < 0 {
                    return Err(AppError::bad_request(format!(
                        "arrows_override must not be negative (day {})",
                        day.day_number
                    )));
                }
            }
            if let Some(distance) = slot.distance_override_m {
                if distance < 0.0 {
                    return Err(AppError::bad_request(format!(
                        "distance_override_m must not be negative (day {})",
                        day.day_number
                    )));
                }
            }
        }
    }
    Ok(())
}

fn trimmed(mut spec: RoutineSpec) -> RoutineSpec {
    spec.name = spec.name.trim().to_string();
    spec
}

pub async fn list(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let trees = composer::list_routine_trees(&state.pool).await?;

    Ok(Json(trees).into_response())
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let tree = composer::load_routine_tree(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("routine {id} not found")))?;

    Ok(Json(tree).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(spec): Json<RoutineSpec>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&spec)?;

    let tree = composer::create_routine(&state.pool, &trimmed(spec)).await?;

    Ok((StatusCode::CREATED, Json(tree)).into_response())
}

pub async fn replace(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(spec): Json<RoutineSpec>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&spec)?;

    let tree = composer::replace_routine_tree(&state.pool, id, &trimmed(spec)).await?;

    Ok(Json(tree).into_response())
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    let assignments = routine_queries::count_assignments_for_routine(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    if assignments > 0 {
        return Err(AppError::conflict(format!(
            "routine is assigned to {assignments} student(s); remove the assignments first"
        )));
    }

    // A concurrent assignment can still slip in between the check and the
    // delete; the foreign key turns that race into a conflict as well.
    let deleted = routine_queries::delete_routine(&state.pool, id)
        .await
        .map_err(|e| {
            AppError::conflict_or_internal(
                e,
                "routine is assigned to a student; remove the assignments first",
            )
        })?;

    if !deleted {
        return Err(AppError::not_found(format!("routine {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
