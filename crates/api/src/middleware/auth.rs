//! JWT-based viewer identity extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hof_core::error::CoreError;
use hof_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated creator extracted from a JWT Bearer token in the
/// `Authorization` header. Rejects the request with 401 when absent or invalid.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The creator's internal database id (from `claims.sub`).
    pub creator_id: DbId,
    /// The creator's role name (e.g. `"creator"`, `"moderator"`).
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        authenticate(auth_header, state)
    }
}

/// Viewer identity for endpoints that also serve anonymous visitors.
///
/// No `Authorization` header yields `OptionalViewer(None)`; a header carrying
/// a bad token is still rejected with 401 rather than silently ignored.
#[derive(Debug, Clone)]
pub struct OptionalViewer(pub Option<AuthUser>);

impl OptionalViewer {
    pub fn creator_id(&self) -> Option<DbId> {
        self.0.as_ref().map(|user| user.creator_id)
    }
}

impl FromRequestParts<AppState> for OptionalViewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => authenticate(header, state).map(|user| OptionalViewer(Some(user))),
            None => Ok(OptionalViewer(None)),
        }
    }
}

fn authenticate(auth_header: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Invalid Authorization format. Expected: Bearer <token>".into(),
        ))
    })?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    Ok(AuthUser {
        creator_id: claims.sub,
        role: claims.role,
    })
}
