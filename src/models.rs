// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// --- Definition Models ---

/// Free-form difficulty tag. Carries no scoring semantics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Other(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Other(tag) => tag.as_str(),
        }
    }
}

impl FromStr for Difficulty {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Other(s.to_string()),
        })
    }
}

impl From<String> for Difficulty {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(d) => d,
            Err(never) => match never {},
        }
    }
}

impl From<Difficulty> for String {
    fn from(d: Difficulty) -> Self {
        d.as_str().to_string()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quiz as uploaded, bundled, or carried inside a share link.
///
/// Field names on the wire follow the links the web app already produces
/// (`timeLimit`, `question`, `correctAnswer`); the longer names are accepted
/// as aliases. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "timeLimit",
        alias = "timeLimitMinutes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub time_limit_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    pub fn is_timed(&self) -> bool {
        self.time_limit_minutes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question", alias = "prompt", default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correctOptionIndex")]
    pub correct_option_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

// --- Session Models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerStatus {
    Correct,
    Incorrect,
    Unattempted,
}

impl AnswerStatus {
    pub fn classify(selected: Option<usize>, correct: usize) -> Self {
        match selected {
            Some(choice) if choice == correct => AnswerStatus::Correct,
            Some(_) => AnswerStatus::Incorrect,
            None => AnswerStatus::Unattempted,
        }
    }
}

/// Derived once at finalize, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub unattempted_count: usize,
    pub total_questions: usize,
    pub percentage: u32,
    pub accuracy: u32,
    pub total_time_seconds: u64,
    pub average_time_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub quiz: QuizDefinition,
    pub results: QuizResult,
    pub user_answers: Vec<Option<usize>>,
    pub time_per_question: Vec<u64>,
}

// --- Views (read-only, handed to the presentation layer) ---

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizPreview {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub question_count: usize,
    pub time_limit_minutes: Option<u32>,
    pub difficulty_breakdown: BTreeMap<String, usize>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub index: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub title: Option<String>,
    pub current: Option<QuestionView>,
    pub total_questions: usize,
    pub answered_count: usize,
    pub progress: f64,
    pub remaining_seconds: Option<u64>,
    pub remaining_display: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub index: usize,
    pub total_questions: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub correct_option_index: usize,
    pub status: AnswerStatus,
    pub explanation: String,
    pub elapsed_seconds: u64,
    pub correct_so_far: usize,
}
