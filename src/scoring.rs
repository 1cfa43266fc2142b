// src/scoring.rs

use crate::constants::*;
use crate::models::{AnswerStatus, Question, QuizResult};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Good,
    Fair,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= LEVEL_EXCELLENT => PerformanceLevel::Excellent,
            p if p >= LEVEL_VERY_GOOD => PerformanceLevel::VeryGood,
            p if p >= LEVEL_GOOD => PerformanceLevel::Good,
            p if p >= LEVEL_FAIR => PerformanceLevel::Fair,
            _ => PerformanceLevel::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::VeryGood => "Very Good",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Fair => "Fair",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Derives the result of an attempt. Pure: same inputs, same output.
///
/// `answers` and `elapsed` are indexed like `questions`; a missing slot counts
/// as unanswered / zero seconds. Percentages and the average are rounded
/// half-up, nothing else is rounded.
pub fn score(
    questions: &[Question],
    answers: &[Option<usize>],
    elapsed: &[u64],
    completed_at: DateTime<Utc>,
) -> QuizResult {
    let mut correct = 0;
    let mut incorrect = 0;
    let mut unattempted = 0;

    for (i, q) in questions.iter().enumerate() {
        let selected = answers.get(i).copied().flatten();
        match AnswerStatus::classify(selected, q.correct_option_index) {
            AnswerStatus::Correct => correct += 1,
            AnswerStatus::Incorrect => incorrect += 1,
            AnswerStatus::Unattempted => unattempted += 1,
        }
    }

    let total = questions.len();
    let total_time: u64 = elapsed.iter().take(total).sum();

    let result = QuizResult {
        correct_count: correct,
        incorrect_count: incorrect,
        unattempted_count: unattempted,
        total_questions: total,
        percentage: rounded_percent(correct, total),
        accuracy: rounded_percent(correct, correct + incorrect),
        total_time_seconds: total_time,
        average_time_seconds: round_half_up_div(total_time, total as u64),
        completed_at,
    };

    debug!(
        "[Scoring] {}/{} correct, {} wrong, {} skipped -> {}% (accuracy {}%)",
        correct, total, incorrect, unattempted, result.percentage, result.accuracy
    );
    result
}

pub fn share_text(title: &str, result: &QuizResult) -> String {
    format!(
        "I scored {}% ({}/{}) on the \"{}\" quiz!",
        result.percentage, result.correct_count, result.total_questions, title
    )
}

// --- Rounding ---

/// `round(part / whole * 100)`, 0 when `whole` is 0.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    round_half_up_div(part as u64 * 100, whole as u64) as u32
}

fn round_half_up_div(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    (2 * numerator + denominator) / (2 * denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(correct: &[usize]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &c)| Question {
                prompt: format!("Q{}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option_index: c,
                explanation: None,
                difficulty: None,
            })
            .collect()
    }

    #[test]
    fn test_three_right_one_wrong_one_skipped() {
        let qs = questions(&[0, 1, 2, 3, 0]);
        let answers = [Some(0), Some(1), Some(2), Some(0), None];
        let elapsed = [4, 6, 5, 10, 2];
        let r = score(&qs, &answers, &elapsed, Utc::now());

        assert_eq!(r.correct_count, 3);
        assert_eq!(r.incorrect_count, 1);
        assert_eq!(r.unattempted_count, 1);
        assert_eq!(r.percentage, 60);
        assert_eq!(r.accuracy, 75);
        assert_eq!(r.total_time_seconds, 27);
        assert_eq!(r.average_time_seconds, 5); // 5.4
    }

    #[test]
    fn test_nothing_attempted_has_zero_accuracy() {
        let qs = questions(&[0, 0, 0]);
        let r = score(&qs, &[None, None, None], &[0, 0, 0], Utc::now());
        assert_eq!(r.accuracy, 0);
        assert_eq!(r.percentage, 0);
        assert_eq!(r.unattempted_count, 3);
        assert_eq!(r.average_time_seconds, 0);
    }

    #[test]
    fn test_option_zero_is_an_answer() {
        let qs = questions(&[1]);
        let r = score(&qs, &[Some(0)], &[0], Utc::now());
        assert_eq!(r.incorrect_count, 1);
        assert_eq!(r.unattempted_count, 0);
    }

    #[test]
    fn test_rounds_half_up() {
        // 1/8 = 12.5% -> 13, 2/3 = 66.67% -> 67, 1/3 -> 33
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(round_half_up_div(5, 2), 3);
        assert_eq!(round_half_up_div(7, 4), 2);
        assert_eq!(round_half_up_div(3, 0), 0);
    }

    #[test]
    fn test_counts_always_sum_to_total() {
        let qs = questions(&[0, 1, 2, 3, 0, 1, 2]);
        let answer_sets: [[Option<usize>; 7]; 3] = [
            [None; 7],
            [Some(0); 7],
            [Some(0), None, Some(2), Some(1), None, Some(1), Some(3)],
        ];
        for answers in answer_sets.iter() {
            let r = score(&qs, answers, &[1; 7], Utc::now());
            assert_eq!(
                r.correct_count + r.incorrect_count + r.unattempted_count,
                r.total_questions
            );
        }
    }

    #[test]
    fn test_short_inputs_count_as_unanswered() {
        let qs = questions(&[0, 0]);
        let r = score(&qs, &[Some(0)], &[], Utc::now());
        assert_eq!(r.correct_count, 1);
        assert_eq!(r.unattempted_count, 1);
        assert_eq!(r.total_time_seconds, 0);
    }

    #[test]
    fn test_performance_levels() {
        assert_eq!(PerformanceLevel::from_percentage(100), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_percentage(90), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_percentage(89), PerformanceLevel::VeryGood);
        assert_eq!(PerformanceLevel::from_percentage(70), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_percentage(60), PerformanceLevel::Fair);
        assert_eq!(
            PerformanceLevel::from_percentage(59),
            PerformanceLevel::NeedsImprovement
        );
        assert_eq!(PerformanceLevel::VeryGood.as_str(), "Very Good");
    }

    #[test]
    fn test_share_text() {
        let qs = questions(&[0, 0, 0, 0, 0]);
        let answers = [Some(0), Some(0), Some(0), None, Some(1)];
        let r = score(&qs, &answers, &[0; 5], Utc::now());
        assert_eq!(
            share_text("Capitals", &r),
            "I scored 60% (3/5) on the \"Capitals\" quiz!"
        );
    }
}
