// src/main.rs

use log::{error, info, warn};
use quiz_engine_lib::models::{AnswerStatus, Phase, QuizPreview};
use quiz_engine_lib::scoring::{self, PerformanceLevel};
use quiz_engine_lib::session::{format_clock, Advance};
use quiz_engine_lib::{EngineConfig, QuizEngine, QuizError};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::mpsc;

const USAGE: &str = "\
usage: quiz-engine [<quiz.json> | <share link> | <token> | --sample] [--share <base-url>] [--history]

while answering:  1..n  pick an option   n  next   p  previous   s  submit";

enum Source {
    File(PathBuf),
    Link(String),
    Sample,
}

#[derive(Default)]
struct Args {
    source: Option<Source>,
    share_base: Option<String>,
    show_history: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(String::new()),
            "--sample" => args.source = Some(Source::Sample),
            "--history" => args.show_history = true,
            "--share" => {
                let base = raw.next().ok_or("--share needs a base URL")?;
                args.share_base = Some(base);
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {}", other)),
            other if Path::new(other).is_file() => args.source = Some(Source::File(other.into())),
            other => args.source = Some(Source::Link(other.to_string())),
        }
    }
    Ok(args)
}

fn load(engine: &QuizEngine, source: &Source) -> Result<QuizPreview, QuizError> {
    match source {
        Source::Sample => Ok(engine.load_sample()),
        Source::Link(link) => engine.load_link(link),
        Source::File(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| QuizError::InvalidOperation(format!("{}: {}", path.display(), e)))?;
            engine.load_text(&text)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("{}\n", msg);
            }
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    info!("Starting quiz engine...");
    let engine = match QuizEngine::new(EngineConfig::from_env()) {
        Ok(engine) => engine,
        Err(e) => {
            warn!("History database unavailable ({}), keeping history in memory", e);
            QuizEngine::in_memory()
        }
    };

    if args.show_history {
        print_history(&engine);
    }

    let Some(source) = args.source else {
        if !args.show_history {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
        return ExitCode::SUCCESS;
    };

    let preview = match load(&engine, &source) {
        Ok(preview) => preview,
        Err(e) => {
            error!("Could not load quiz: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_preview(&preview);

    if let Some(base) = args.share_base {
        return match engine.share_url(&base) {
            Ok(url) => {
                println!("{}", url);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Could not build share link: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = engine.start() {
        error!("Could not start quiz: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = run(&engine, spawn_stdin_reader()).await {
        error!("Input error: {}", e);
        if let Err(e) = engine.force_complete() {
            error!("Could not submit quiz: {}", e);
            return ExitCode::FAILURE;
        }
    }

    print_result(&engine);
    print_review(&engine);
    ExitCode::SUCCESS
}

/// Reads stdin on a detached thread so a pending read never holds up exit.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run(
    engine: &QuizEngine,
    mut lines: mpsc::UnboundedReceiver<std::io::Result<String>>,
) -> std::io::Result<()> {
    let mut phases = engine.subscribe();
    print_question(engine);

    while engine.phase() == Phase::Active {
        tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() || *phases.borrow() != Phase::Active {
                    println!("\nTime is up!");
                    break;
                }
            }
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    // stdin closed: submit what we have
                    if let Err(e) = engine.force_complete() {
                        warn!("Could not submit quiz: {}", e);
                    }
                    break;
                };
                handle_command(engine, line.trim());
            }
        }
    }
    Ok(())
}

fn handle_command(engine: &QuizEngine, command: &str) {
    let outcome = match command {
        "n" | "next" => engine.advance().map(|step| match step {
            Advance::Moved(_) => print_question(engine),
            Advance::Completed(_) => {}
        }),
        "p" | "prev" => engine.retreat().map(|_| print_question(engine)),
        "s" | "submit" => engine.force_complete().map(|_| ()),
        "" => {
            print_question(engine);
            Ok(())
        }
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => engine.select_answer(n - 1).map(|_| print_question(engine)),
            _ => {
                println!("{}", USAGE);
                Ok(())
            }
        },
    };
    if let Err(e) = outcome {
        println!("  ! {}", e);
    }
}

// --- Output ---

fn print_preview(preview: &QuizPreview) {
    println!("\n== {} ==", preview.title);
    if let Some(description) = &preview.description {
        println!("{}", description);
    }
    if let Some(category) = &preview.category {
        println!("Category: {}", category);
    }
    let limit = preview
        .time_limit_minutes
        .map_or_else(|| "no limit".to_string(), |m| format!("{} min", m));
    println!("{} questions, {}", preview.question_count, limit);
    for (difficulty, count) in &preview.difficulty_breakdown {
        println!("  {}: {}", difficulty, count);
    }
}

fn print_question(engine: &QuizEngine) {
    let snap = engine.snapshot();
    let Some(q) = snap.current else {
        return;
    };
    let clock = snap
        .remaining_display
        .map(|t| format!("  [{} left]", t))
        .unwrap_or_default();
    println!(
        "\nQuestion {}/{} ({:.0}%){}",
        q.index + 1,
        snap.total_questions,
        snap.progress * 100.0,
        clock
    );
    println!("{}", q.prompt);
    for (i, option) in q.options.iter().enumerate() {
        let marker = if q.selected == Some(i) { '*' } else { ' ' };
        println!(" {} {}) {}", marker, i + 1, option);
    }
}

fn print_result(engine: &QuizEngine) {
    let Some(result) = engine.result() else {
        return;
    };
    let title = engine
        .pending()
        .map(|d| d.title.clone())
        .unwrap_or_default();
    let level = PerformanceLevel::from_percentage(result.percentage);

    println!("\n== Results: {} ==", level.as_str());
    println!(
        "Score {}%  |  correct {}  incorrect {}  skipped {}  |  accuracy {}%",
        result.percentage,
        result.correct_count,
        result.incorrect_count,
        result.unattempted_count,
        result.accuracy
    );
    println!(
        "Time {}  (avg {}s per question)",
        format_clock(result.total_time_seconds),
        result.average_time_seconds
    );
    println!("{}", scoring::share_text(&title, &result));
}

fn print_review(engine: &QuizEngine) {
    let total = engine.snapshot().total_questions;
    println!("\n== Review ==");
    for i in 0..total {
        if engine.jump_to(i).is_err() {
            break;
        }
        let Ok(item) = engine.review_item() else {
            break;
        };
        let status = match item.status {
            AnswerStatus::Correct => "correct",
            AnswerStatus::Incorrect => "incorrect",
            AnswerStatus::Unattempted => "skipped",
        };
        println!(
            "\n{}/{} [{}] {}  ({}s, {} right so far)",
            item.index + 1,
            item.total_questions,
            status,
            item.prompt,
            item.elapsed_seconds,
            item.correct_so_far
        );
        for (j, option) in item.options.iter().enumerate() {
            let marker = if j == item.correct_option_index {
                "+"
            } else if item.selected == Some(j) {
                "x"
            } else {
                " "
            };
            println!(" {} {}) {}", marker, j + 1, option);
        }
        println!("   {}", item.explanation);
    }
}

fn print_history(engine: &QuizEngine) {
    let entries = engine.history();
    let summary = engine.history_summary();
    println!(
        "\n== History: {} quizzes, average {}%, {}/{} correct ==",
        summary.total_quizzes, summary.average_percentage, summary.total_correct, summary.total_questions
    );
    for entry in entries {
        println!(
            "{}  {:>3}%  {}",
            entry.results.completed_at.format("%Y-%m-%d %H:%M"),
            entry.results.percentage,
            entry.quiz.title
        );
    }
}
