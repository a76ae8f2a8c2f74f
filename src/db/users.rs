// src/db/users.rs

use sqlx::{PgConnection, PgExecutor};

use crate::models::user::{LeaderboardEntry, ProfileRow, TelegramIdentity, User};

/// Inserts the user or refreshes their identity fields, keeping quiz progress.
pub async fn upsert(ex: impl PgExecutor<'_>, identity: &TelegramIdentity) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, first_name, language_code)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET
            username = EXCLUDED.username,
            first_name = EXCLUDED.first_name,
            language_code = EXCLUDED.language_code,
            updated_at = now()
        RETURNING id, username, first_name, language_code, score, score_reached_at, created_at, updated_at
        "#,
    )
    .bind(identity.id)
    .bind(&identity.username)
    .bind(&identity.first_name)
    .bind(&identity.language_code)
    .fetch_one(ex)
    .await
}

/// Loads a user's progress. `current_question_id` is the lowest-id unanswered question.
pub async fn profile(ex: impl PgExecutor<'_>, user_id: i64) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT
            u.id, u.username, u.first_name, u.score,
            (SELECT COUNT(*) FROM answers a WHERE a.user_id = u.id) AS answered_count,
            (SELECT COUNT(*) FROM answers a WHERE a.user_id = u.id AND a.is_correct) AS correct_count,
            (SELECT COUNT(*) FROM questions) AS total_questions,
            (
                SELECT q.id FROM questions q
                WHERE NOT EXISTS (
                    SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.user_id = u.id
                )
                ORDER BY q.id
                LIMIT 1
            ) AS current_question_id
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(ex)
    .await
}

/// Top scorers. Ties go to whoever reached the score first.
pub async fn leaderboard(ex: impl PgExecutor<'_>, limit: i64) -> sqlx::Result<Vec<LeaderboardEntry>> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            ROW_NUMBER() OVER (ORDER BY score DESC, score_reached_at ASC, id ASC) AS rank,
            id AS user_id,
            COALESCE(username, first_name) AS display_name,
            score
        FROM users
        WHERE score > 0
        ORDER BY score DESC, score_reached_at ASC, id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(ex)
    .await
}

/// Takes a row lock on the user for the rest of the transaction.
/// Returns `false` if the user doesn't exist.
pub async fn lock(conn: &mut PgConnection, user_id: i64) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Adds `points` to the user's score and returns the new total.
pub async fn add_score(conn: &mut PgConnection, user_id: i64, points: i32) -> sqlx::Result<i64> {
    let (score,): (i64,) = sqlx::query_as(
        r#"
        UPDATE users SET
            score = score + $2,
            score_reached_at = CASE WHEN $2 > 0 THEN now() ELSE score_reached_at END,
            updated_at = now()
        WHERE id = $1
        RETURNING score
        "#,
    )
    .bind(user_id)
    .bind(i64::from(points))
    .fetch_one(conn)
    .await?;
    Ok(score)
}
