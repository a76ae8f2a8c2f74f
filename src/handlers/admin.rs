// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    db,
    error::AppError,
    models::question::{CreateQuestionRequest, NewQuestion},
};

/// Lists every question, answers included.
/// Admin only.
pub async fn list_questions(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let questions = db::questions::list(&pool).await.map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(questions))
}

/// Creates a new question.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.check().map_err(AppError::BadRequest)?;

    let question = db::questions::insert(&pool, &NewQuestion::from(payload))
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

    tracing::info!(question_id = question.id, "Question created");
    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces a question in place. Points already awarded for it are kept.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.check().map_err(AppError::BadRequest)?;

    let question = db::questions::update(&pool, id, &NewQuestion::from(payload))
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Deletes a question and withdraws the points it awarded.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    if !db::questions::delete(&mut tx, id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to delete question {}: {:?}", id, e);
        AppError::from(e)
    })?;

    tracing::info!(question_id = id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}
