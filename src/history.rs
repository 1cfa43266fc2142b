// src/history.rs

use crate::constants::HISTORY_LIMIT;
use crate::models::{HistoryEntry, QuizDefinition, QuizResult};
use log::debug;
use serde::Serialize;
use std::collections::VecDeque;

/// Most-recent-first log of completed attempts, capped at `limit` entries.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_quizzes: usize,
    pub average_percentage: u32,
    pub total_questions: usize,
    pub total_correct: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl HistoryStore {
    pub fn new(limit: usize) -> Self {
        HistoryStore {
            entries: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    /// Rebuilds a store from persisted entries (newest first).
    pub fn from_entries(limit: usize, entries: Vec<HistoryEntry>) -> Self {
        let mut store = Self::new(limit);
        store.entries = entries.into_iter().take(store.limit).collect();
        store
    }

    /// Inserts at the head and evicts from the tail. Returns the evicted ids.
    pub fn append(&mut self, entry: HistoryEntry) -> Vec<i64> {
        debug!("[History] Append entry {} ('{}')", entry.id, entry.quiz.title);
        self.entries.push_front(entry);
        let mut evicted = Vec::new();
        while self.entries.len() > self.limit {
            if let Some(old) = self.entries.pop_back() {
                debug!("[History] Evict entry {}", old.id);
                evicted.push(old.id);
            }
        }
        evicted
    }

    /// Builds the entry for a finished attempt with an id strictly greater
    /// than the current head's.
    pub fn record(
        &mut self,
        quiz: &QuizDefinition,
        results: &QuizResult,
        answers: &[Option<usize>],
        elapsed: &[u64],
    ) -> HistoryEntry {
        let stamp = results.completed_at.timestamp_millis();
        let id = match self.entries.front() {
            Some(head) if head.id >= stamp => head.id + 1,
            _ => stamp,
        };
        let entry = HistoryEntry {
            id,
            quiz: quiz.clone(),
            results: results.clone(),
            user_answers: answers.to_vec(),
            time_per_question: elapsed.to_vec(),
        };
        self.append(entry.clone());
        entry
    }

    pub fn list(&self) -> impl ExactSizeIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: i64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summary(&self) -> HistorySummary {
        let total_quizzes = self.entries.len();
        let percent_sum: u64 = self
            .entries
            .iter()
            .map(|e| u64::from(e.results.percentage))
            .sum();
        let average_percentage = if total_quizzes == 0 {
            0
        } else {
            ((2 * percent_sum + total_quizzes as u64) / (2 * total_quizzes as u64)) as u32
        };

        HistorySummary {
            total_quizzes,
            average_percentage,
            total_questions: self.entries.iter().map(|e| e.results.total_questions).sum(),
            total_correct: self.entries.iter().map(|e| e.results.correct_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::sample_quiz;
    use chrono::{TimeZone, Utc};

    fn result(percentage: u32, correct: usize, total: usize, at_ms: i64) -> QuizResult {
        QuizResult {
            correct_count: correct,
            incorrect_count: total - correct,
            unattempted_count: 0,
            total_questions: total,
            percentage,
            accuracy: percentage,
            total_time_seconds: 0,
            average_time_seconds: 0,
            completed_at: Utc.timestamp_millis_opt(at_ms).unwrap(),
        }
    }

    fn entry(id: i64) -> HistoryEntry {
        HistoryEntry {
            id,
            quiz: sample_quiz(),
            results: result(50, 4, 8, id),
            user_answers: vec![None; 8],
            time_per_question: vec![0; 8],
        }
    }

    #[test]
    fn test_eleventh_entry_evicts_oldest() {
        let mut store = HistoryStore::default();
        for id in 1..=10 {
            assert!(store.append(entry(id)).is_empty());
        }
        assert_eq!(store.len(), 10);

        let evicted = store.append(entry(11));
        assert_eq!(evicted, vec![1]);
        assert_eq!(store.len(), 10);

        let ids: Vec<i64> = store.list().map(|e| e.id).collect();
        assert_eq!(ids, (2..=11).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_record_ids_strictly_increase() {
        let quiz = sample_quiz();
        let mut store = HistoryStore::new(5);
        let r = result(75, 6, 8, 1_700_000_000_000);

        let a = store.record(&quiz, &r, &[Some(1); 8], &[3; 8]);
        let b = store.record(&quiz, &r, &[Some(1); 8], &[3; 8]);
        assert_eq!(a.id, 1_700_000_000_000);
        assert_eq!(b.id, a.id + 1);
        assert_eq!(store.list().next().map(|e| e.id), Some(b.id));
        assert_eq!(store.get(a.id).unwrap().time_per_question, vec![3; 8]);
    }

    #[test]
    fn test_from_entries_truncates() {
        let entries: Vec<HistoryEntry> = (1..=6).rev().map(entry).collect();
        let store = HistoryStore::from_entries(4, entries);
        let ids: Vec<i64> = store.list().map(|e| e.id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3]);
    }

    #[test]
    fn test_summary() {
        let mut store = HistoryStore::default();
        assert_eq!(
            store.summary(),
            HistorySummary {
                total_quizzes: 0,
                average_percentage: 0,
                total_questions: 0,
                total_correct: 0
            }
        );

        let quiz = sample_quiz();
        store.record(&quiz, &result(60, 3, 5, 1), &[], &[]);
        store.record(&quiz, &result(75, 6, 8, 2), &[], &[]);
        let s = store.summary();
        assert_eq!(s.total_quizzes, 2);
        assert_eq!(s.average_percentage, 68); // 67.5
        assert_eq!(s.total_questions, 13);
        assert_eq!(s.total_correct, 9);

        store.clear();
        assert!(store.is_empty());
    }
}
