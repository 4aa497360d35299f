//! `quiver serve`: the HTTP API.
//!
//! Reads are public; every mutating endpoint requires a bearer token from
//! `POST /auth/login` and an admin or coach role. Alongside the listener, a
//! background task runs the retention sweeps on a fixed interval, starting
//! with one sweep right after startup.

pub mod auth;

mod assignments;
mod exercises;
mod routines;
mod students;


use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use tower_http::cors::CorsLayer;

use quiver_core::CoreError;
use quiver_core::auth::token::TokenConfig;
use quiver_core::retention;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }

    /// Map a database-layer failure: unique and foreign key violations become
    /// a 409 with `msg`, anything else a 500.
    pub fn conflict_or_internal(err: anyhow::Error, msg: &str) -> Self {
        let is_integrity = err.chain().any(|cause| {
            match cause.downcast_ref::<sqlx::Error>() {
                Some(sqlx::Error::Database(db)) => matches!(
                    db.kind(),
                    ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation
                ),
                _ => false,
            }
        });
        if is_integrity {
            Self::conflict(msg)
        } else {
            Self::internal(err)
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::StudentNotFound(_)
            | CoreError::RoutineNotFound(_)
            | CoreError::AssignmentNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::DuplicateDayNumber(_)
            | CoreError::DayNumberOutOfRange(_)
            | CoreError::DuplicateSortOrder { .. }
            | CoreError::UnknownExercise(_) => StatusCode::BAD_REQUEST,
            CoreError::WeekConflict { .. } | CoreError::Integrity(_) => StatusCode::CONFLICT,
            CoreError::Db(_) | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/exercises", get(exercises::list).post(exercises::create))
        .route(
            "/exercises/{id}",
            get(exercises::get_one)
                .put(exercises::update)
                .delete(exercises::remove),
        )
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/{id}",
            get(students::get_one).put(students::update),
        )
        .route("/students/{id}/status", patch(students::set_status))
        .route("/routines", get(routines::list).post(routines::create))
        .route(
            "/routines/{id}",
            get(routines::get_one)
                .put(routines::replace)
                .delete(routines::remove),
        )
        .route(
            "/assignments",
            get(assignments::list).post(assignments::create),
        )
        .route(
            "/assignments/{id}",
            patch(assignments::set_status).delete(assignments::remove),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(
    pool: PgPool,
    tokens: TokenConfig,
    bind: &str,
    port: u16,
    sweep_interval_secs: u64,
) -> Result<()> {
    let state = AppState {
        pool: pool.clone(),
        tokens,
    };
    let app = build_router(state);

    let sweeper = if sweep_interval_secs > 0 {
        Some(tokio::spawn(retention_sweeper(
            pool,
            Duration::from_secs(sweep_interval_secs),
        )))
    } else {
        None
    };

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("quiver serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("quiver serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

/// Run the retention sweeps forever on a fixed interval. The first tick fires
/// immediately, so a long-idle database is cleaned as soon as the server
/// comes up.
async fn retention_sweeper(pool: PgPool, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(e) = retention::run_maintenance(&pool, retention::INACTIVE_PURGE_DAYS).await {
            tracing::warn!(error = %e, "retention sweep failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Root handlers
// ---------------------------------------------------------------------------

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "quiver",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::internal(e.into()))?;

    Ok(Json(serde_json::json!({ "status": "ok" })).into_response())
}
