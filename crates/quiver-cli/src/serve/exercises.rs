//! Exercise catalogue endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use quiver_db::queries::exercises::{self, ExerciseInput};

use super::auth::AuthUser;
use super::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ExercisePayload {
    pub name: String,
    pub arrows_count: i32,
    pub distance_m: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn validate(payload: &ExercisePayload) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be blank"));
    }
    if payload.arrows_count < 0 {
        return Err(AppError::bad_request("arrows_count must not be negative"));
    }
    if payload.distance_m < 0.0 {
        return Err(AppError::bad_request("distance_m must not be negative"));
    }
    Ok(())
}

impl ExercisePayload {
    fn as_input(&self) -> ExerciseInput<'_> {
        ExerciseInput {
            name: self.name.trim(),
            arrows_count: self.arrows_count,
            distance_m: self.distance_m,
            description: self.description.as_deref(),
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub only_active: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<axum::response::Response, AppError> {
    let items = exercises::list_exercises(&state.pool, params.only_active)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(items).into_response())
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let exercise = exercises::get_exercise(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("exercise {id} not found")))?;

    Ok(Json(exercise).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ExercisePayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&payload)?;

    let exercise = exercises::insert_exercise(&state.pool, &payload.as_input())
        .await
        .map_err(AppError::internal)?;

    Ok((StatusCode::CREATED, Json(exercise)).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExercisePayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&payload)?;

    let exercise = exercises::update_exercise(&state.pool, id, &payload.as_input())
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("exercise {id} not found")))?;

    Ok(Json(exercise).into_response())
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    let deleted = exercises::delete_exercise(&state.pool, id)
        .await
        .map_err(|e| {
            AppError::conflict_or_internal(e, "exercise is referenced by a routine day")
        })?;

    if !deleted {
        return Err(AppError::not_found(format!("exercise {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
