//! Login endpoint and bearer-token request authentication.

use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use quiver_core::auth::{password, token};
use quiver_db::models::{Role, User};
use quiver_db::queries::users;

use super::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

/// `POST /auth/login`: exchange credentials for a session token.
///
/// Unknown username, disabled account, and wrong password all produce the
/// same rejection, so the endpoint does not reveal which usernames exist.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<axum::response::Response, AppError> {
    let user = users::get_user_by_username(&state.pool, &req.username)
        .await
        .map_err(AppError::internal)?;

    let Some(user) = user else {
        return Err(AppError::unauthorized("invalid username or password"));
    };
    if !user.is_active || !password::verify_password(&req.password, &user.password_hash) {
        return Err(AppError::unauthorized("invalid username or password"));
    }

    let access_token = token::generate_token(&state.tokens, user.id);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
    })
    .into_response())
}

/// An authenticated user, extracted from the `Authorization: Bearer` header.
///
/// Rejects with 401 when the header is missing or malformed, the token fails
/// validation, or the account behind it has been removed or disabled.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        let bearer = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Authorization header must be 'Bearer <token>'")
        })?;

        let claims = token::validate_token(&state.tokens, bearer)
            .map_err(|e| AppError::unauthorized(e.to_string()))?;

        let user = users::get_user(&state.pool, claims.user_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::unauthorized("token user no longer exists"))?;

        if !user.is_active {
            return Err(AppError::unauthorized("user account is disabled"));
        }

        Ok(AuthUser(user))
    }
}

impl AuthUser {
    /// Mutating endpoints require a staff role; archer accounts are
    /// read-only.
    pub fn require_staff(&self) -> Result<(), AppError> {
        match self.0.role {
            Role::Admin | Role::Coach => Ok(()),
            Role::Archer => Err(AppError::forbidden("requires an admin or coach role")),
        }
    }
}
