// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table. The primary key is the Telegram user id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub language_code: Option<String>,
    pub score: i64,
    pub score_reached_at: chrono::DateTime<chrono::Utc>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Identity fields refreshed every time a user shows up (bot `/start` or Mini App session).
#[derive(Debug, Clone)]
pub struct TelegramIdentity {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub language_code: Option<String>,
}

/// Row produced by the profile query.
#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub score: i64,
    pub answered_count: i64,
    pub correct_count: i64,
    pub total_questions: i64,
    pub current_question_id: Option<i64>,
}

/// Aggregated quiz progress for one user.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub score: i64,
    pub answered_count: i64,
    pub correct_count: i64,
    pub total_questions: i64,
    pub current_question_id: Option<i64>,
    pub finished: bool,
    pub is_admin: bool,
}

impl Profile {
    pub fn from_row(row: ProfileRow, is_admin: bool) -> Self {
        Self {
            user_id: row.id,
            finished: row.total_questions > 0 && row.current_question_id.is_none(),
            username: row.username,
            first_name: row.first_name,
            score: row.score,
            answered_count: row.answered_count,
            correct_count: row.correct_count,
            total_questions: row.total_questions,
            current_question_id: row.current_question_id,
            is_admin,
        }
    }

    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.first_name)
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub display_name: String,
    pub score: i64,
}

/// Query string of `GET /api/leaderboard`.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

/// Response of `POST /api/session`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(total: i64, current: Option<i64>) -> ProfileRow {
        ProfileRow {
            id: 7,
            username: None,
            first_name: "Ann".to_string(),
            score: 0,
            answered_count: 0,
            correct_count: 0,
            total_questions: total,
            current_question_id: current,
        }
    }

    #[test]
    fn test_finished_only_when_questions_exist() {
        assert!(!Profile::from_row(row(0, None), false).finished);
        assert!(!Profile::from_row(row(3, Some(1)), false).finished);
        assert!(Profile::from_row(row(3, None), false).finished);
    }

    #[test]
    fn test_display_name_falls_back_to_first_name() {
        let profile = Profile::from_row(row(0, None), false);
        assert_eq!(profile.display_name(), "Ann");
    }
}
