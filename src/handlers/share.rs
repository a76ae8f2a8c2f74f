// src/handlers/share.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::Config,
    db,
    error::AppError,
    handlers::session::load_profile,
    models::share_card::ShareResponse,
    share,
    utils::jwt::Claims,
};

/// Snapshots the caller's result and returns the URL of its image.
pub async fn create_share(
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = load_profile(&pool, claims.user_id()?, claims.is_admin()).await?;

    let card = db::share_cards::create(&pool, &profile).await.map_err(|e| {
        tracing::error!("Failed to create share card: {:?}", e);
        AppError::from(e)
    })?;

    let share_image_url = config.share_image_url(&card.slug.to_string()).to_string();
    tracing::info!(user_id = profile.user_id, slug = %card.slug, "Share card created");

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            slug: card.slug,
            share_image_url,
        }),
    ))
}

/// Serves `/share/{slug}.png`. Cards never change, so the response is cacheable forever.
pub async fn share_image(
    State(pool): State<PgPool>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let slug = parse_slug(&file).ok_or(AppError::NotFound("Share card not found".to_string()))?;

    let card = db::share_cards::find(&pool, slug)
        .await?
        .ok_or(AppError::NotFound("Share card not found".to_string()))?;

    let png = share::render(card).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        png,
    ))
}

fn parse_slug(file: &str) -> Option<Uuid> {
    file.strip_suffix(".png")
        .and_then(|slug| Uuid::parse_str(slug).ok())
}
