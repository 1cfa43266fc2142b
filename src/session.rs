// src/session.rs

//! In-progress attempt state and the navigation rules over it.
//!
//! Every time-dependent method takes the current monotonic instant from the
//! caller. `QuizEngine` passes `Instant::now()`; tests pass synthetic ones.

use crate::codec;
use crate::constants::*;
use crate::error::{QuizError, Result};
use crate::models::{
    AnswerStatus, Phase, QuestionView, QuizDefinition, QuizPreview, QuizResult, ReviewItem,
    SessionSnapshot,
};
use crate::scoring;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

/// Where the pointer went after `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Completed(QuizResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to count down: untimed, or not active.
    Idle,
    Running(u64),
    Expired,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    definition: Option<Arc<QuizDefinition>>,
    phase: Phase,
    current_index: usize,
    answers: Vec<Option<usize>>,
    elapsed: Vec<u64>,
    remaining_seconds: Option<u64>,
    started_at: Option<Instant>,
    last_transition: Option<Instant>,
    result: Option<QuizResult>,
    review_cursor: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            definition: None,
            phase: Phase::NotStarted,
            current_index: 0,
            answers: Vec::new(),
            elapsed: Vec::new(),
            remaining_seconds: None,
            started_at: None,
            last_transition: None,
            result: None,
            review_cursor: 0,
        }
    }

    // --- Lifecycle ---

    /// Replaces whatever this session held. On a validation failure the
    /// previous state is left untouched.
    pub fn start_at(&mut self, definition: Arc<QuizDefinition>, now: Instant) -> Result<()> {
        codec::validate(&definition).map_err(QuizError::InvalidDefinition)?;

        let count = definition.questions.len();
        let remaining = definition
            .time_limit_minutes
            .map(|m| u64::from(m) * SECONDS_PER_MINUTE);

        info!(
            "[Session] Starting '{}' ({} questions, limit: {})",
            definition.title,
            count,
            remaining.map_or_else(|| "none".to_string(), format_clock)
        );

        *self = SessionState {
            definition: Some(definition),
            phase: Phase::Active,
            current_index: 0,
            answers: vec![None; count],
            elapsed: vec![0; count],
            remaining_seconds: remaining,
            started_at: Some(now),
            last_transition: Some(now),
            result: None,
            review_cursor: 0,
        };
        Ok(())
    }

    pub fn reset(&mut self) {
        debug!("[Session] Reset");
        *self = SessionState::new();
    }

    // --- Answering & Navigation ---

    /// Last write wins; timing is unaffected.
    pub fn select_answer(&mut self, option: usize) -> Result<()> {
        self.require_phase(Phase::Active, "select an answer")?;
        let options = self.active_definition()?.questions[self.current_index]
            .options
            .len();
        if option >= options {
            return Err(QuizError::invalid_op(format!(
                "option {} does not exist (question has {} options)",
                option, options
            )));
        }
        debug!(
            "[Session] Q{} answered with option {}",
            self.current_index + 1,
            option
        );
        self.answers[self.current_index] = Some(option);
        Ok(())
    }

    pub fn advance_at(&mut self, now: Instant) -> Result<Advance> {
        self.require_phase(Phase::Active, "advance")?;
        let last = self.answers.len() - 1;
        if self.current_index == last {
            let result = self.finalize(now)?;
            return Ok(Advance::Completed(result));
        }
        self.record_elapsed(now);
        self.current_index += 1;
        Ok(Advance::Moved(self.current_index))
    }

    /// Time spent going back is charged to no question.
    pub fn retreat_at(&mut self, now: Instant) -> Result<usize> {
        self.require_phase(Phase::Active, "go back")?;
        if self.current_index == 0 {
            return Err(QuizError::invalid_op("already at the first question"));
        }
        self.current_index -= 1;
        self.last_transition = Some(now);
        Ok(self.current_index)
    }

    /// Finalizes from any question. Returns `None` when already completed,
    /// so calling it twice is harmless.
    pub fn force_complete_at(&mut self, now: Instant) -> Result<Option<QuizResult>> {
        match self.phase {
            Phase::Completed => {
                debug!("[Session] Already completed, ignoring");
                Ok(None)
            }
            Phase::NotStarted => Err(QuizError::invalid_op("no quiz in progress")),
            Phase::Active => self.finalize(now).map(Some),
        }
    }

    /// One countdown step. Reaching zero reports `Expired`; the caller finalizes.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Active {
            return TickOutcome::Idle;
        }
        match self.remaining_seconds {
            None => TickOutcome::Idle,
            Some(secs) => {
                let left = secs.saturating_sub(1);
                self.remaining_seconds = Some(left);
                if left == 0 {
                    TickOutcome::Expired
                } else {
                    TickOutcome::Running(left)
                }
            }
        }
    }

    // --- Review ---

    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        self.require_phase(Phase::Completed, "review")?;
        if index >= self.answers.len() {
            return Err(QuizError::invalid_op(format!(
                "question {} does not exist",
                index + 1
            )));
        }
        self.review_cursor = index;
        Ok(index)
    }

    pub fn review_next(&mut self) -> Result<usize> {
        self.jump_to(self.review_cursor + 1)
    }

    pub fn review_previous(&mut self) -> Result<usize> {
        if self.review_cursor == 0 {
            self.require_phase(Phase::Completed, "review")?;
            return Err(QuizError::invalid_op("already at the first question"));
        }
        self.jump_to(self.review_cursor - 1)
    }

    pub fn review_item(&self) -> Result<ReviewItem> {
        self.require_phase(Phase::Completed, "review")?;
        let definition = self.active_definition()?;
        let i = self.review_cursor;
        let q = &definition.questions[i];
        let selected = self.answers[i];

        let correct_so_far = definition.questions[..=i]
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.correct_option_index))
            .count();

        Ok(ReviewItem {
            index: i,
            total_questions: definition.questions.len(),
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            selected,
            correct_option_index: q.correct_option_index,
            status: AnswerStatus::classify(selected, q.correct_option_index),
            explanation: q
                .explanation
                .clone()
                .unwrap_or_else(|| NO_EXPLANATION_TEXT.to_string()),
            elapsed_seconds: self.elapsed[i],
            correct_so_far,
        })
    }

    // --- Read-only Views ---

    pub fn snapshot(&self) -> SessionSnapshot {
        let total = self.answers.len();
        let position = match self.phase {
            Phase::NotStarted => None,
            Phase::Active => Some(self.current_index),
            Phase::Completed => Some(self.review_cursor),
        };

        let current = match (&self.definition, position) {
            (Some(def), Some(i)) => def.questions.get(i).map(|q| QuestionView {
                index: i,
                prompt: q.prompt.clone(),
                options: q.options.clone(),
                selected: self.answers[i],
            }),
            _ => None,
        };

        SessionSnapshot {
            phase: self.phase,
            title: self.definition.as_ref().map(|d| d.title.clone()),
            current,
            total_questions: total,
            answered_count: self.answers.iter().filter(|a| a.is_some()).count(),
            progress: match position {
                Some(i) if total > 0 => (i + 1) as f64 / total as f64,
                _ => 0.0,
            },
            remaining_seconds: self.remaining_seconds,
            remaining_display: self.remaining_seconds.map(format_clock),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn definition(&self) -> Option<&Arc<QuizDefinition>> {
        self.definition.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn review_cursor(&self) -> usize {
        self.review_cursor
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn elapsed_seconds(&self) -> &[u64] {
        &self.elapsed
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    // --- Internal Logic ---

    fn finalize(&mut self, now: Instant) -> Result<QuizResult> {
        self.record_elapsed(now);
        let definition = self.active_definition()?.clone();
        let result = scoring::score(
            &definition.questions,
            &self.answers,
            &self.elapsed,
            Utc::now(),
        );
        info!(
            "[Session] Completed '{}': {}% ({}/{}) in {}s",
            definition.title,
            result.percentage,
            result.correct_count,
            result.total_questions,
            result.total_time_seconds
        );
        self.phase = Phase::Completed;
        self.review_cursor = 0;
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Charges `now - last_transition` to the current question.
    fn record_elapsed(&mut self, now: Instant) {
        let Some(last) = self.last_transition else {
            return;
        };
        let spent = match now.checked_duration_since(last) {
            Some(d) => d.as_secs(),
            None => {
                warn!("[Session] Clock moved backward, charging 0s");
                0
            }
        };
        self.elapsed[self.current_index] += spent;
        self.last_transition = Some(now);
        debug!(
            "[Session] Q{} +{}s (total {}s)",
            self.current_index + 1,
            spent,
            self.elapsed[self.current_index]
        );
    }

    fn require_phase(&self, expected: Phase, action: &str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(QuizError::invalid_op(format!(
                "cannot {} while {:?}",
                action, self.phase
            )))
        }
    }

    fn active_definition(&self) -> Result<&Arc<QuizDefinition>> {
        self.definition
            .as_ref()
            .ok_or_else(|| QuizError::invalid_op("no quiz loaded"))
    }
}

// --- Helpers ---

pub fn preview(definition: &QuizDefinition) -> QuizPreview {
    let mut breakdown = BTreeMap::new();
    for q in &definition.questions {
        if let Some(d) = &q.difficulty {
            *breakdown.entry(d.to_string()).or_insert(0) += 1;
        }
    }
    QuizPreview {
        title: definition.title.clone(),
        description: definition.description.clone(),
        category: definition.category.clone(),
        question_count: definition.questions.len(),
        time_limit_minutes: definition.time_limit_minutes,
        difficulty_breakdown: breakdown,
    }
}

/// `MM:SS`, minutes zero-padded to two digits.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
