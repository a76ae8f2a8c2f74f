// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    config::Config,
    db,
    error::AppError,
    models::user::{Profile, SessionResponse, TelegramIdentity},
    telegram::init_data::{self, WebAppUser},
    utils::jwt::{Claims, ROLE_ADMIN, ROLE_USER, sign_jwt},
};

/// Scheme Telegram Mini Apps conventionally use to pass raw init data.
const INIT_DATA_SCHEME: &str = "tma ";

impl From<WebAppUser> for TelegramIdentity {
    fn from(user: WebAppUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            language_code: user.language_code,
        }
    }
}

/// Exchanges signed Telegram init data for an API session token.
///
/// * Validates `Authorization: tma <initData>` against the bot token.
/// * Creates the user on first visit, refreshes their names otherwise.
/// * Returns a Bearer token plus the user's current progress.
pub async fn create_session(
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(INIT_DATA_SCHEME))
        .ok_or_else(|| AppError::AuthError("Missing Telegram init data".to_string()))?;

    let data = init_data::validate(raw, &config.bot_token, config.init_data_max_age).map_err(|e| {
        tracing::warn!("Rejected init data: {}", e);
        AppError::from(e)
    })?;

    let identity = TelegramIdentity::from(data.user);
    db::users::upsert(&pool, &identity).await.map_err(|e| {
        tracing::error!("Failed to upsert user {}: {:?}", identity.id, e);
        AppError::from(e)
    })?;

    let is_admin = config.is_admin(identity.id);
    let role = if is_admin { ROLE_ADMIN } else { ROLE_USER };
    let token = sign_jwt(identity.id, role, &config.jwt_secret, config.jwt_expiration)?;

    let profile = load_profile(&pool, identity.id, is_admin).await?;
    tracing::info!(user_id = identity.id, "Mini App session opened");

    Ok(Json(SessionResponse {
        token,
        token_type: "Bearer",
        expires_in: config.jwt_expiration,
        user: profile,
    }))
}

/// Current user's profile and progress.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = load_profile(&pool, claims.user_id()?, claims.is_admin()).await?;
    Ok(Json(profile))
}

pub(crate) async fn load_profile(pool: &PgPool, user_id: i64, is_admin: bool) -> Result<Profile, AppError> {
    let row = db::users::profile(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    Ok(Profile::from_row(row, is_admin))
}
