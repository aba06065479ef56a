use axum::{extract::FromRequestParts, http::header};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    entity::{Users, sea_orm_active_enums::Role},
    error::AppError,
    state::AppState,
};

/// Caller identity resolved from a bearer token against the user store.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        resolve_token(state, token).await
    }
}

/// Decode `token` and load its subject; unknown or deactivated subjects are rejected.
pub async fn resolve_token(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state.tokens.decode(token)?;
    let user_id = claims.subject()?;

    let user = Users::find_by_id(user_id).one(state.db()).await?;
    match user {
        Some(u) if u.is_active => Ok(AuthUser {
            user_id: u.id,
            username: u.username,
            role: u.role,
        }),
        _ => Err(AppError::unauthorized()),
    }
}
