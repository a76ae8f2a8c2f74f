// src/models/share_card.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the 'share_cards' table: an immutable snapshot of a result.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareCard {
    pub slug: Uuid,
    pub user_id: i64,
    pub display_name: String,
    pub score: i64,
    pub correct_count: i64,
    pub answered_count: i64,
    pub total_questions: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ShareCard {
    /// Fraction of the quiz answered correctly, in `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        (self.correct_count as f64 / self.total_questions as f64).clamp(0.0, 1.0)
    }
}

/// Response of `POST /api/share`.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub slug: Uuid,
    pub share_image_url: String,
}
