// src/codec.rs

//! Quiz definition codec.
//!
//! A share token is `base64url(percent_escape(json))` without padding, so it
//! can sit in a query string as-is. Uploads, the bundled sample and decoded
//! tokens all pass through [`parse_definition`] and [`validate`].

use crate::constants::*;
use crate::error::{DecodeError, QuizError, SchemaViolation};
use crate::models::{Difficulty, Question, QuizDefinition};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::debug;
use url::Url;

// --- Public Interface ---

pub fn encode(definition: &QuizDefinition) -> crate::error::Result<String> {
    let json = serde_json::to_string(definition)?;
    let escaped = urlencoding::encode(&json);
    Ok(URL_SAFE_NO_PAD.encode(escaped.as_bytes()))
}

pub fn decode(token: &str) -> Result<QuizDefinition, DecodeError> {
    let normalized = normalize_token(token);
    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| DecodeError::Malformed(format!("token is not base64: {}", e)))?;
    let escaped = String::from_utf8(bytes)
        .map_err(|_| DecodeError::Malformed("token does not hold text".to_string()))?;
    let json = urlencoding::decode(&escaped)
        .map_err(|_| DecodeError::Malformed("token holds invalid escapes".to_string()))?;
    parse_definition(&json)
}

/// The single validation gate for raw quiz text.
pub fn parse_definition(text: &str) -> Result<QuizDefinition, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let definition: QuizDefinition = serde_json::from_value(value)
        .map_err(|e| SchemaViolation::Structure(e.to_string()))?;
    validate(&definition)?;
    debug!(
        "[Codec] Accepted quiz '{}' ({} questions)",
        definition.title,
        definition.questions.len()
    );
    Ok(definition)
}

pub fn validate(definition: &QuizDefinition) -> Result<(), SchemaViolation> {
    if definition.title.trim().is_empty() {
        return Err(SchemaViolation::MissingTitle);
    }
    if definition.questions.is_empty() {
        return Err(SchemaViolation::NoQuestions);
    }
    if definition.time_limit_minutes == Some(0) {
        return Err(SchemaViolation::ZeroTimeLimit);
    }
    for (i, q) in definition.questions.iter().enumerate() {
        validate_question(i + 1, q)?;
    }
    Ok(())
}

/// Builds `<base>?quiz=<token>`, keeping any query pairs already on `base`.
pub fn share_url(base: &str, definition: &QuizDefinition) -> crate::error::Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| QuizError::invalid_op(format!("invalid base URL {:?}: {}", base, e)))?;
    let token = encode(definition)?;
    url.query_pairs_mut().append_pair(SHARE_QUERY_PARAM, &token);
    Ok(url)
}

pub fn token_from_url(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == SHARE_QUERY_PARAM)
        .map(|(_, v)| v.into_owned())
}

// --- Internal Helpers ---

fn validate_question(number: usize, q: &Question) -> Result<(), SchemaViolation> {
    if q.prompt.trim().is_empty() {
        return Err(SchemaViolation::MissingPrompt { question: number });
    }
    if q.options.len() < MIN_OPTIONS {
        return Err(SchemaViolation::TooFewOptions {
            question: number,
            count: q.options.len(),
        });
    }
    if q.correct_option_index >= q.options.len() {
        return Err(SchemaViolation::CorrectOptionOutOfRange {
            question: number,
            index: q.correct_option_index,
            options: q.options.len(),
        });
    }
    Ok(())
}

/// Accepts the standard alphabet and padding as well, plus the `+` -> space
/// damage done by form-style query parsing.
fn normalize_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

// --- Sample Data ---

pub fn sample_quiz() -> QuizDefinition {
    let q = |prompt: &str, options: [&str; 4], correct: usize, explanation: &str, d: Difficulty| {
        Question {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index: correct,
            explanation: Some(explanation.to_string()),
            difficulty: Some(d),
        }
    };

    QuizDefinition {
        title: "Elite Knowledge Challenge".to_string(),
        description: Some("Test your knowledge with these carefully crafted questions".to_string()),
        time_limit_minutes: Some(5),
        category: Some("General Knowledge".to_string()),
        difficulty: Some(Difficulty::Other("intermediate".to_string())),
        questions: vec![
            q(
                "What is the capital of France?",
                ["London", "Paris", "Berlin", "Madrid"],
                1,
                "Paris has been the capital of France since the 5th century and is known as the 'City of Light'.",
                Difficulty::Easy,
            ),
            q(
                "Which planet is known as the Red Planet?",
                ["Venus", "Mars", "Jupiter", "Saturn"],
                1,
                "Mars appears red due to iron oxide (rust) on its surface, giving it the distinctive reddish appearance.",
                Difficulty::Easy,
            ),
            q(
                "Who painted the Mona Lisa?",
                ["Van Gogh", "Leonardo da Vinci", "Picasso", "Michelangelo"],
                1,
                "Leonardo da Vinci painted the Mona Lisa between 1503 and 1519. It's housed in the Louvre Museum in Paris.",
                Difficulty::Medium,
            ),
            q(
                "What is the largest ocean on Earth?",
                ["Atlantic Ocean", "Indian Ocean", "Arctic Ocean", "Pacific Ocean"],
                3,
                "The Pacific Ocean covers about 63 million square miles, making it larger than all land masses combined.",
                Difficulty::Medium,
            ),
            q(
                "Which element has the chemical symbol 'Au'?",
                ["Silver", "Gold", "Aluminum", "Argon"],
                1,
                "Gold's chemical symbol 'Au' comes from the Latin word 'aurum', meaning 'shining dawn'.",
                Difficulty::Medium,
            ),
            q(
                "In which year did World War II end?",
                ["1944", "1945", "1946", "1947"],
                1,
                "World War II ended in 1945 with the surrender of Japan on September 2, 1945.",
                Difficulty::Medium,
            ),
            q(
                "What is the speed of light in vacuum?",
                ["299,792,458 m/s", "300,000,000 m/s", "299,000,000 m/s", "301,000,000 m/s"],
                0,
                "The speed of light in vacuum is exactly 299,792,458 meters per second, a fundamental constant of nature.",
                Difficulty::Hard,
            ),
            q(
                "Which programming language was created by Guido van Rossum?",
                ["Java", "Python", "JavaScript", "C++"],
                1,
                "Python was created by Guido van Rossum and first released in 1991. It's named after Monty Python's Flying Circus.",
                Difficulty::Medium,
            ),
        ],
    }
}
