//! Assignment endpoints.
//!
//! Creation goes through the scheduler, which enforces the one-active-
//! assignment-per-week rule; status changes and deletion are plain row
//! operations.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use quiver_core::schedule::{self, NewAssignment};
use quiver_db::models::AssignmentStatus;
use quiver_db::queries::assignments as assignment_queries;

use super::auth::AuthUser;
use super::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: AssignmentStatus,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<axum::response::Response, AppError> {
    let items = match params.student_id {
        Some(student_id) => {
            assignment_queries::list_assignments_for_student(&state.pool, student_id)
                .await
                .map_err(AppError::internal)?
        }
        None => assignment_queries::list_assignments(&state.pool)
            .await
            .map_err(AppError::internal)?,
    };

    Ok(Json(items).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NewAssignment>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    if let (Some(start), Some(end)) = (payload.start_date, payload.end_date) {
        if end < start {
            return Err(AppError::bad_request(
                "end_date must not be before start_date",
            ));
        }
    }

    let assignment = schedule::create_assignment(&state.pool, &payload).await?;

    Ok((StatusCode::CREATED, Json(assignment)).into_response())
}

pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusPayload>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    let assignment = schedule::set_assignment_status(&state.pool, id, payload.status).await?;

    Ok(Json(assignment).into_response())
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    user.require_staff()?;

    let deleted = assignment_queries::delete_assignment(&state.pool, id)
        .await
        .map_err(AppError::internal)?;

    if !deleted {
        return Err(AppError::not_found(format!("assignment {id} not found")));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
