// src/db/questions.rs

use sqlx::{PgConnection, PgExecutor, types::Json};

use crate::models::question::{Grade, NewQuestion, Question};

pub async fn list(ex: impl PgExecutor<'_>) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        "SELECT id, content, options, answer, analysis, points, created_at FROM questions ORDER BY id",
    )
    .fetch_all(ex)
    .await
}

/// Loads a question and share-locks it until the transaction ends.
/// A concurrent [`delete`] waits for the lock.
pub async fn find_for_share(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        "SELECT id, content, options, answer, analysis, points, created_at FROM questions WHERE id = $1 FOR SHARE",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// The lowest-id question the user hasn't answered yet.
pub async fn current_for(ex: impl PgExecutor<'_>, user_id: i64) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT q.id, q.content, q.options, q.answer, q.analysis, q.points, q.created_at
        FROM questions q
        WHERE NOT EXISTS (
            SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.user_id = $1
        )
        ORDER BY q.id
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(ex)
    .await
}

pub async fn is_answered(conn: &mut PgConnection, user_id: i64, question_id: i64) -> sqlx::Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT question_id FROM answers WHERE user_id = $1 AND question_id = $2")
            .bind(user_id)
            .bind(question_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}

pub async fn record_answer(
    conn: &mut PgConnection,
    user_id: i64,
    question_id: i64,
    chosen: &str,
    grade: &Grade,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO answers (user_id, question_id, chosen, is_correct, points_awarded)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .bind(chosen)
    .bind(grade.correct)
    .bind(grade.points_awarded)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert(ex: impl PgExecutor<'_>, q: &NewQuestion) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (content, options, answer, analysis, points)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, content, options, answer, analysis, points, created_at
        "#,
    )
    .bind(&q.content)
    .bind(Json(&q.options))
    .bind(&q.answer)
    .bind(&q.analysis)
    .bind(q.points)
    .fetch_one(ex)
    .await
}

/// Replaces a question's content. Already awarded points are left untouched.
pub async fn update(ex: impl PgExecutor<'_>, id: i64, q: &NewQuestion) -> sqlx::Result<Option<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        UPDATE questions SET
            content = $2, options = $3, answer = $4, analysis = $5, points = $6
        WHERE id = $1
        RETURNING id, content, options, answer, analysis, points, created_at
        "#,
    )
    .bind(id)
    .bind(&q.content)
    .bind(Json(&q.options))
    .bind(&q.answer)
    .bind(&q.analysis)
    .bind(q.points)
    .fetch_optional(ex)
    .await
}

/// Deletes a question, taking back the points it awarded.
/// Must run inside a transaction. Returns `false` if there was no such question.
pub async fn delete(conn: &mut PgConnection, id: i64) -> sqlx::Result<bool> {
    // Waits for in-flight answers to the question to commit first.
    let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    if locked.is_none() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE users u SET
            score = u.score - a.points_awarded,
            score_reached_at = now(),
            updated_at = now()
        FROM answers a
        WHERE a.user_id = u.id AND a.question_id = $1 AND a.points_awarded > 0
        "#,
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
