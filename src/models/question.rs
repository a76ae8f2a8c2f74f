// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::utils::html::clean_html;

/// Points a question is worth unless the author says otherwise.
pub const DEFAULT_POINTS: i32 = 10;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text content of the question.
    pub content: String,

    /// List of options, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// The correct option. Always one of `options`.
    pub answer: String,

    /// Explanation shown after the question is answered.
    pub analysis: Option<String>,

    pub points: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a question to the Mini App (excludes answer and analysis).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub options: Vec<String>,
    pub points: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            content: q.content,
            options: q.options.0,
            points: q.points,
        }
    }
}

/// Outcome of checking a submitted answer against a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub correct: bool,
    pub points_awarded: i32,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownOption;

impl Question {
    /// Grades `submitted` against the stored answer.
    ///
    /// The submission must name one of the options after trimming whitespace.
    pub fn grade(&self, submitted: &str) -> Result<Grade, UnknownOption> {
        let submitted = submitted.trim();
        if !self.options.iter().any(|opt| opt.trim() == submitted) {
            return Err(UnknownOption);
        }

        let correct = submitted == self.answer.trim();
        Ok(Grade {
            correct,
            points_awarded: if correct { self.points } else { 0 },
        })
    }
}

/// Request to answer the current question.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1, max = 200))]
    pub answer: String,
}

/// Result returned after a question is answered.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub correct_answer: String,
    pub analysis: Option<String>,
    pub points_awarded: i32,
    pub score: i64,
    pub next_question_id: Option<i64>,
    pub finished: bool,
}

/// The Mini App's view of where the user is in the quiz.
#[derive(Debug, Serialize)]
pub struct CurrentQuestionResponse {
    pub question: Option<PublicQuestion>,
    /// 1-based index of `question`, or 0 when there is none.
    pub position: i64,
    pub total_questions: i64,
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(length(min = 2, max = 8), custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 200))]
    pub answer: String,
    #[validate(length(max = 2000))]
    pub analysis: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub points: Option<i32>,
}

impl CreateQuestionRequest {
    /// Field validation plus the cross-field rule that `answer` is one of `options`.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        let answer = self.answer.trim();
        if !self.options.iter().any(|opt| opt.trim() == answer) {
            return Err("answer must be one of the options".to_string());
        }
        Ok(())
    }
}

/// A validated, sanitized question ready to be stored.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub content: String,
    pub options: Vec<String>,
    pub answer: String,
    pub analysis: Option<String>,
    pub points: i32,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(req: CreateQuestionRequest) -> Self {
        Self {
            content: clean_html(req.content.trim()),
            options: req.options.iter().map(|opt| opt.trim().to_string()).collect(),
            answer: req.answer.trim().to_string(),
            analysis: req
                .analysis
                .map(|a| clean_html(a.trim()))
                .filter(|a| !a.is_empty()),
            points: req.points.unwrap_or(DEFAULT_POINTS),
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for (i, opt) in options.iter().enumerate() {
        let opt = opt.trim();
        if opt.is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 200 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if options[..i].iter().any(|prev| prev.trim() == opt) {
            return Err(validator::ValidationError::new("duplicate_option"));
        }
    }
    Ok(())
}
