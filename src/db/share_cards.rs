// src/db/share_cards.rs

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{share_card::ShareCard, user::Profile};

/// Snapshots the profile into a new card.
pub async fn create(ex: impl PgExecutor<'_>, profile: &Profile) -> sqlx::Result<ShareCard> {
    sqlx::query_as::<_, ShareCard>(
        r#"
        INSERT INTO share_cards
            (slug, user_id, display_name, score, correct_count, answered_count, total_questions)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING slug, user_id, display_name, score, correct_count, answered_count, total_questions, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(profile.user_id)
    .bind(profile.display_name())
    .bind(profile.score)
    .bind(profile.correct_count)
    .bind(profile.answered_count)
    .bind(profile.total_questions)
    .fetch_one(ex)
    .await
}

pub async fn find(ex: impl PgExecutor<'_>, slug: Uuid) -> sqlx::Result<Option<ShareCard>> {
    sqlx::query_as::<_, ShareCard>(
        r#"
        SELECT slug, user_id, display_name, score, correct_count, answered_count, total_questions, created_at
        FROM share_cards
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(ex)
    .await
}
