// src/constants.rs

use std::time::Duration;

// --- Time Constants ---
pub const SECONDS_PER_MINUTE: u64 = 60;
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// --- Definition Rules ---
pub const MIN_OPTIONS: usize = 2;

// --- Share Links ---
pub const SHARE_QUERY_PARAM: &str = "quiz";

// --- History ---
pub const HISTORY_LIMIT: usize = 10;

// --- Performance Levels (percentage thresholds) ---
pub const LEVEL_EXCELLENT: u32 = 90;
pub const LEVEL_VERY_GOOD: u32 = 80;
pub const LEVEL_GOOD: u32 = 70;
pub const LEVEL_FAIR: u32 = 60;

// --- Review ---
pub const NO_EXPLANATION_TEXT: &str = "No explanation provided for this question.";

// --- Environment ---
pub const ENV_HISTORY_DB: &str = "QUIZ_HISTORY_DB";
pub const ENV_HISTORY_LIMIT: &str = "QUIZ_HISTORY_LIMIT";
pub const ENV_NO_HISTORY_DB: &str = "QUIZ_NO_HISTORY_DB";
pub const DEFAULT_DB_DIR: &str = "quiz-engine";
pub const DEFAULT_DB_FILE: &str = "quiz_history.db";
