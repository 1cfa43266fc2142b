// src/lib.rs

//! Quiz session engine: validate and share quiz definitions, run a timed or
//! untimed attempt, score it, and keep a short history of past attempts.

pub mod codec;
pub mod config;
pub mod constants;
pub mod database;
pub mod engine;
pub mod error;
pub mod history;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod session;
pub mod timer;

pub use config::EngineConfig;
pub use engine::QuizEngine;
pub use error::{DecodeError, QuizError, Result, SchemaViolation};
pub use models::{HistoryEntry, Phase, Question, QuizDefinition, QuizResult};
pub use session::{Advance, SessionState};
