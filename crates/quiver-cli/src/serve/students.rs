//! Student roster endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use quiver_db::queries::students::{self, NewStudent, StudentUpdate};

use super::auth::AuthUser;
use super::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct StudentPayload {
    pub full_name: String,
    pub document_number: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub bow_pounds: Option<f64>,
    #[serde(default)]
    pub arrows_available: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn validate(payload: &StudentPayload) -> Result<(), AppError> {
    if payload.full_name.trim().is_empty() {
        return Err(AppError::bad_request("full_name must not be blank"));
    }
    if payload.document_number.trim().is_empty() {
        return Err(AppError::bad_request("document_number must not be blank"));
    }
    if let Some(pounds) = payload.bow_pounds {
        if pounds <= 0.0 {
            return Err(AppError::bad_request("bow_pounds must be positive"));
        }
    }
    if let Some(arrows) = payload.arrows_available {
        if arrows < 0 {
            return Err(AppError::bad_request(
                "arrows_available must not be negative",
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub only_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub is_active: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<axum::response::Response, AppError> {
    let items = students::list_students(&state.pool, params.only_active)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(items).into_response())
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let student = students::get_student(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("student {id} not found")))?;

    Ok(Json(student).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<StudentPayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&payload)?;

    let new = NewStudent {
        full_name: payload.full_name.trim(),
        document_number: payload.document_number.trim(),
        contact: payload.contact.as_deref(),
        bow_pounds: payload.bow_pounds,
        arrows_available: payload.arrows_available,
    };
    let student = students::insert_student(&state.pool, &new)
        .await
        .map_err(|e| {
            AppError::conflict_or_internal(
                e,
                "a student with this document number already exists",
            )
        })?;

    Ok((StatusCode::CREATED, Json(student)).into_response())
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StudentPayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;
    validate(&payload)?;

    let update = StudentUpdate {
        full_name: payload.full_name.trim(),
        document_number: payload.document_number.trim(),
        contact: payload.contact.as_deref(),
        bow_pounds: payload.bow_pounds,
        arrows_available: payload.arrows_available,
        is_active: payload.is_active,
    };
    let student = students::update_student(&state.pool, id, &update)
        .await
        .map_err(|e| {
            AppError::conflict_or_internal(
                e,
                "a student with this document number already exists",
            )
        })?
        .ok_or_else(|| AppError::not_found(format!("student {id} not found")))?;

    Ok(Json(student).into_response())
}

/// `PATCH /students/{id}/status`: flip the active flag without touching the
/// rest of the record. Deactivating starts the retention clock; reactivating
/// clears it.
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    let student = students::set_student_active(&state.pool, id, payload.is_active)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("student {id} not found")))?;

    Ok(Json(student).into_response())
}
