// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    db,
    error::{AppError, is_unique_violation},
    models::question::{AnswerResponse, CurrentQuestionResponse, PublicQuestion, SubmitAnswerRequest},
    utils::jwt::Claims,
};

/// Returns the caller's current question without its answer.
///
/// Questions are served in id order; once all are answered `question` is `null`.
pub async fn current_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let profile = db::users::profile(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let question = db::questions::current_for(&pool, user_id).await.map_err(|e| {
        tracing::error!("Failed to fetch current question: {:?}", e);
        AppError::from(e)
    })?;

    // `position` is 0 once there is no question left.
    let position = if question.is_some() {
        profile.answered_count + 1
    } else {
        0
    };

    Ok(Json(CurrentQuestionResponse {
        question: question.map(PublicQuestion::from),
        position,
        total_questions: profile.total_questions,
    }))
}

/// Answers the caller's current question.
///
/// * 404 if the question doesn't exist.
/// * 409 if it was already answered, or isn't the current question.
/// * 400 if the answer isn't one of the options.
///
/// The question row is share-locked and the user row locked for the duration.
/// Concurrent submissions from the same user are serialized, and a question
/// can't be deleted while an answer to it is in flight.
pub async fn submit_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    let mut tx = pool.begin().await?;

    // Question first, then user: the same order `db::questions::delete` locks in.
    let question = db::questions::find_for_share(&mut tx, question_id)
        .await?
        .ok_or(AppError::NotFound(format!("Question {question_id} not found")))?;

    if !db::users::lock(&mut tx, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if db::questions::is_answered(&mut tx, user_id, question_id).await? {
        return Err(AppError::Conflict("Question already answered".to_string()));
    }

    let current = db::questions::current_for(&mut *tx, user_id).await?;
    if current.as_ref().map(|q| q.id) != Some(question_id) {
        return Err(AppError::Conflict("Not the current question".to_string()));
    }

    let grade = question
        .grade(&req.answer)
        .map_err(|_| AppError::BadRequest("Answer must be one of the options".to_string()))?;

    db::questions::record_answer(&mut tx, user_id, question_id, req.answer.trim(), &grade)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Question already answered".to_string())
            } else {
                tracing::error!("Failed to record answer: {:?}", e);
                AppError::from(e)
            }
        })?;

    let score = db::users::add_score(&mut tx, user_id, grade.points_awarded).await?;
    let next = db::questions::current_for(&mut *tx, user_id).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        question_id,
        correct = grade.correct,
        score,
        "Answer recorded"
    );

    let next_question_id = next.map(|q| q.id);
    Ok(Json(AnswerResponse {
        correct: grade.correct,
        correct_answer: question.answer,
        analysis: question.analysis,
        points_awarded: grade.points_awarded,
        score,
        next_question_id,
        finished: next_question_id.is_none(),
    }))
}
