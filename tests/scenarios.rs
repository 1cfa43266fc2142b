use quiz_engine_lib::codec;
use quiz_engine_lib::models::{Difficulty, Question};
use quiz_engine_lib::{
    Advance, DecodeError, EngineConfig, Phase, QuizDefinition, QuizEngine, QuizError,
    SchemaViolation,
};
use std::time::Duration;

fn quiz(title: &str, questions: usize, limit: Option<u32>) -> QuizDefinition {
    QuizDefinition {
        title: title.to_string(),
        description: Some("integration".to_string()),
        time_limit_minutes: limit,
        category: None,
        difficulty: None,
        questions: (0..questions)
            .map(|i| Question {
                prompt: format!("Question {}", i + 1),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_option_index: i % 4,
                explanation: None,
                difficulty: Some(Difficulty::Medium),
            })
            .collect(),
    }
}

#[test]
fn test_scenario_a_untimed_mixed_answers() {
    let engine = QuizEngine::in_memory();
    let token = codec::encode(&quiz("Scenario A", 5, None)).unwrap();
    engine.load_token(&token).unwrap();
    engine.start().unwrap();

    // correct, correct, wrong, skip, correct
    for choice in [Some(0), Some(1), Some(0), None, Some(0)] {
        if let Some(c) = choice {
            engine.select_answer(c).unwrap();
        }
        engine.advance().unwrap();
    }

    let result = engine.result().unwrap();
    assert_eq!(engine.phase(), Phase::Completed);
    assert_eq!(result.correct_count, 3);
    assert_eq!(result.incorrect_count, 1);
    assert_eq!(result.unattempted_count, 1);
    assert_eq!(result.percentage, 60);
    assert_eq!(result.accuracy, 75);
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_timer_expiry_finalizes() {
    let engine = QuizEngine::in_memory();
    let mut phases = engine.subscribe();
    engine.start_with(quiz("Scenario B", 3, Some(1))).unwrap();
    engine.select_answer(0).unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;
    engine.advance().unwrap();

    phases
        .wait_for(|p| *p == Phase::Completed)
        .await
        .unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.phase, Phase::Completed);
    assert_eq!(snap.remaining_seconds, Some(0));
    assert_eq!(snap.remaining_display.as_deref(), Some("00:00"));
    assert!(!engine.is_timer_running());

    // Q1 left after 20s, Q2 was active at expiry and gets the other 40s.
    assert_eq!(engine.elapsed_seconds(), vec![20, 40, 0]);
    let result = engine.result().unwrap();
    assert_eq!(result.total_time_seconds, 60);
    assert_eq!(result.correct_count, 1);
    assert_eq!(result.unattempted_count, 2);

    // A late submit is a no-op and does not duplicate history.
    assert_eq!(engine.force_complete().unwrap(), result);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_scenario_c_malformed_token_leaves_session_alone() {
    let engine = QuizEngine::in_memory();
    engine.start_with(quiz("Existing", 2, None)).unwrap();
    engine.select_answer(3).unwrap();
    let before = engine.snapshot();

    for junk in ["~~~", "Zm9vYmFy", "aGVsbG8=", "%7Bbroken"] {
        let err = engine.load_token(junk).unwrap_err();
        assert!(
            matches!(err, QuizError::Decode(DecodeError::Malformed(_))),
            "{:?} -> {:?}",
            junk,
            err
        );
    }

    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.pending().unwrap().title, "Existing");
}

#[test]
fn test_scenario_d_out_of_range_correct_answer() {
    let mut bad = quiz("Scenario D", 2, None);
    bad.questions[1].options.truncate(3);
    bad.questions[1].correct_option_index = 4;

    let token = codec::encode(&bad).unwrap();
    assert_eq!(
        codec::decode(&token),
        Err(DecodeError::InvalidSchema(
            SchemaViolation::CorrectOptionOutOfRange {
                question: 2,
                index: 4,
                options: 3
            }
        ))
    );

    let engine = QuizEngine::in_memory();
    assert!(matches!(
        engine.start_with(bad),
        Err(QuizError::InvalidDefinition(_))
    ));
    assert_eq!(engine.phase(), Phase::NotStarted);
}

#[test]
fn test_scenario_e_history_keeps_ten_newest() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        database_path: Some(dir.path().join("history.db")),
        ..EngineConfig::default()
    };
    let engine = QuizEngine::new(config.clone()).unwrap();

    for n in 1..=10 {
        engine.start_with(quiz(&format!("Quiz {}", n), 1, None)).unwrap();
        engine.force_complete().unwrap();
    }
    let oldest_id = engine.history().last().unwrap().id;
    assert_eq!(engine.history().len(), 10);

    engine.start_with(quiz("Quiz 11", 1, None)).unwrap();
    engine.select_answer(0).unwrap();
    assert!(matches!(engine.advance().unwrap(), Advance::Completed(_)));

    let history = engine.history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].quiz.title, "Quiz 11");
    assert_eq!(history[9].quiz.title, "Quiz 2");
    assert!(history.iter().all(|e| e.id != oldest_id));
    assert!(history.windows(2).all(|w| w[0].id > w[1].id));

    let reloaded = QuizEngine::new(config).unwrap().history();
    assert_eq!(reloaded, history);
}

#[test]
fn test_navigation_invariants_hold() {
    let engine = QuizEngine::in_memory();
    engine.start_with(quiz("Walk", 4, None)).unwrap();

    let steps = ["n", "p", "p", "n", "n", "n", "p", "n", "n"];
    for step in steps {
        let _ = match step {
            "n" => engine.advance().map(|_| ()),
            _ => engine.retreat().map(|_| ()),
        };
        let snap = engine.snapshot();
        let current = snap.current.unwrap();
        assert!(current.index < snap.total_questions);
        assert_eq!(engine.elapsed_seconds().len(), 4);
    }
    assert_eq!(engine.phase(), Phase::Completed);
    assert!(matches!(engine.retreat(), Err(QuizError::InvalidOperation(_))));
    assert!(matches!(
        engine.select_answer(0),
        Err(QuizError::InvalidOperation(_))
    ));
}

#[test]
fn test_review_after_completion() {
    let engine = QuizEngine::in_memory();
    engine.load_sample();
    let sample = engine.pending().unwrap();
    let mut untimed = (*sample).clone();
    untimed.time_limit_minutes = None;
    engine.start_with(untimed).unwrap();

    engine.select_answer(1).unwrap();
    engine.force_complete().unwrap();

    assert_eq!(engine.jump_to(7).unwrap(), 7);
    let last = engine.review_item().unwrap();
    assert_eq!(last.selected, None);
    assert_eq!(last.correct_so_far, 1);
    assert!(last.explanation.starts_with("Python was created"));
    assert!(engine.review_next().is_err());
}
