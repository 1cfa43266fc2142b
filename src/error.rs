// src/error.rs

use thiserror::Error;

/// A structural rule a quiz definition broke. Question numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("{0}")]
    Structure(String),

    #[error("quiz title is missing")]
    MissingTitle,

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question {question} has no prompt")]
    MissingPrompt { question: usize },

    #[error("question {question} has {count} option(s), at least 2 required")]
    TooFewOptions { question: usize, count: usize },

    #[error("question {question}: correct answer {index} is out of range for {options} options")]
    CorrectOptionOutOfRange {
        question: usize,
        index: usize,
        options: usize,
    },

    #[error("time limit must be a positive number of minutes")]
    ZeroTimeLimit,
}

/// Failure to turn a share token or raw text into a quiz definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed quiz data: {0}")]
    Malformed(String),

    #[error("invalid quiz schema: {0}")]
    InvalidSchema(#[from] SchemaViolation),
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid quiz definition: {0}")]
    InvalidDefinition(SchemaViolation),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuizError {
    pub(crate) fn invalid_op(msg: impl Into<String>) -> Self {
        QuizError::InvalidOperation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
