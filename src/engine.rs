// src/engine.rs

//! The owned handle the presentation layer drives.
//!
//! All mutation of session and history goes through one `Mutex<EngineState>`.
//! The countdown task is the only other holder of that state; it re-checks
//! its cancellation token under the lock, and every path that leaves `Active`
//! cancels the token while still holding the lock, so no tick can land after
//! such a call returns.

use crate::codec;
use crate::config::EngineConfig;
use crate::database;
use crate::error::{QuizError, Result};
use crate::history::{HistoryStore, HistorySummary};
use crate::models::{
    HistoryEntry, Phase, QuizDefinition, QuizPreview, QuizResult, ReviewItem, SessionSnapshot,
};
use crate::repository;
use crate::session::{self, Advance, SessionState, TickOutcome};
use crate::timer::Countdown;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

struct EngineState {
    session: SessionState,
    pending: Option<Arc<QuizDefinition>>,
    history: HistoryStore,
    countdown: Option<Countdown>,
    db: Option<Connection>,
}

struct Shared {
    state: Mutex<EngineState>,
    phase_tx: watch::Sender<Phase>,
}

#[derive(Clone)]
pub struct QuizEngine {
    shared: Arc<Shared>,
    config: EngineConfig,
}

impl QuizEngine {
    /// Opens the configured history database, if any, and loads recent history.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let db = match &config.database_path {
            Some(path) => {
                info!("[Engine] History database: {:?}", path);
                Some(database::open(path)?)
            }
            None => None,
        };
        Self::build(config, db)
    }

    pub fn in_memory() -> Self {
        let config = EngineConfig::default();
        let history = HistoryStore::new(config.history_capacity());
        Self::assemble(config, history, None)
    }

    /// Uses an already opened connection for history persistence.
    pub fn with_connection(config: EngineConfig, conn: Connection) -> Result<Self> {
        database::init_db(&conn)?;
        Self::build(config, Some(conn))
    }

    fn build(config: EngineConfig, db: Option<Connection>) -> Result<Self> {
        let entries = match &db {
            Some(conn) => repository::load_history(conn, config.history_capacity())?,
            None => Vec::new(),
        };
        debug!("[Engine] Loaded {} history entries", entries.len());
        let history = HistoryStore::from_entries(config.history_capacity(), entries);
        Ok(Self::assemble(config, history, db))
    }

    fn assemble(config: EngineConfig, history: HistoryStore, db: Option<Connection>) -> Self {
        let (phase_tx, _) = watch::channel(Phase::NotStarted);
        QuizEngine {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    session: SessionState::new(),
                    pending: None,
                    history,
                    countdown: None,
                    db,
                }),
                phase_tx,
            }),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Loading (upload / sample / share link) ---

    /// Validates raw quiz text and stages it for preview. A failure leaves
    /// the engine untouched.
    pub fn load_text(&self, text: &str) -> Result<QuizPreview> {
        let definition = codec::parse_definition(text)?;
        Ok(self.stage(definition))
    }

    pub fn load_token(&self, token: &str) -> Result<QuizPreview> {
        let definition = codec::decode(token)?;
        Ok(self.stage(definition))
    }

    /// Accepts a full share link (`...?quiz=<token>`) or a bare token.
    pub fn load_link(&self, link: &str) -> Result<QuizPreview> {
        match codec::token_from_url(link) {
            Some(token) => self.load_token(&token),
            None => self.load_token(link),
        }
    }

    pub fn load_sample(&self) -> QuizPreview {
        self.stage(codec::sample_quiz())
    }

    pub fn pending(&self) -> Option<Arc<QuizDefinition>> {
        self.shared.lock().pending.clone()
    }

    /// Share link for the staged quiz, or the one in progress.
    pub fn share_url(&self, base: &str) -> Result<Url> {
        let definition = {
            let state = self.shared.lock();
            state
                .pending
                .clone()
                .or_else(|| state.session.definition().cloned())
        }
        .ok_or_else(|| QuizError::invalid_op("no quiz loaded"))?;
        Ok(codec::share_url(base, &definition)?)
    }

    fn stage(&self, definition: QuizDefinition) -> QuizPreview {
        let preview = session::preview(&definition);
        info!(
            "[Engine] Staged '{}' ({} questions)",
            preview.title, preview.question_count
        );
        self.shared.lock().pending = Some(Arc::new(definition));
        preview
    }

    // --- Session Lifecycle ---

    /// Starts the staged quiz.
    pub fn start(&self) -> Result<()> {
        let definition = self
            .shared
            .lock()
            .pending
            .clone()
            .ok_or_else(|| QuizError::invalid_op("no quiz loaded"))?;
        self.start_definition(definition)
    }

    /// Starts a definition that did not come through a loader.
    pub fn start_with(&self, definition: QuizDefinition) -> Result<()> {
        self.start_definition(Arc::new(definition))
    }

    fn start_definition(&self, definition: Arc<QuizDefinition>) -> Result<()> {
        codec::validate(&definition).map_err(QuizError::InvalidDefinition)?;

        let mut state = self.shared.lock();
        let countdown = if definition.is_timed() {
            Some(self.spawn_countdown()?)
        } else {
            None
        };

        if let Some(old) = state.countdown.take() {
            old.cancel();
        }
        state.session.start_at(definition.clone(), Instant::now())?;
        state.pending = Some(definition);
        state.countdown = countdown;
        self.shared.phase_tx.send_replace(Phase::Active);
        Ok(())
    }

    fn spawn_countdown(&self) -> Result<Countdown> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let config = self.config.clone();
        Countdown::spawn(self.config.tick_interval, move |token| {
            match weak.upgrade() {
                Some(shared) => shared.on_tick(token, &config),
                None => ControlFlow::Break(()),
            }
        })
    }

    pub fn select_answer(&self, option: usize) -> Result<()> {
        self.shared.lock().session.select_answer(option)
    }

    pub fn advance(&self) -> Result<Advance> {
        let mut state = self.shared.lock();
        let step = state.session.advance_at(Instant::now())?;
        if let Advance::Completed(result) = &step {
            self.shared.after_completion(&mut state, result, &self.config);
        }
        Ok(step)
    }

    pub fn retreat(&self) -> Result<usize> {
        self.shared.lock().session.retreat_at(Instant::now())
    }

    /// Explicit submit. Calling it again returns the stored result and does
    /// not touch history.
    pub fn force_complete(&self) -> Result<QuizResult> {
        let mut state = self.shared.lock();
        self.shared
            .force_complete_locked(&mut state, &self.config)?
            .or_else(|| state.session.result().cloned())
            .ok_or_else(|| QuizError::invalid_op("no result available"))
    }

    /// Back to the start screen: stops the countdown and forgets the attempt.
    pub fn reset(&self) {
        let mut state = self.shared.lock();
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel();
        }
        state.session.reset();
        state.pending = None;
        self.shared.phase_tx.send_replace(Phase::NotStarted);
    }

    // --- Review ---

    pub fn jump_to(&self, index: usize) -> Result<usize> {
        self.shared.lock().session.jump_to(index)
    }

    pub fn review_next(&self) -> Result<usize> {
        self.shared.lock().session.review_next()
    }

    pub fn review_previous(&self) -> Result<usize> {
        self.shared.lock().session.review_previous()
    }

    pub fn review_item(&self) -> Result<ReviewItem> {
        self.shared.lock().session.review_item()
    }

    // --- Read-only Views ---

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().session.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().session.phase()
    }

    pub fn result(&self) -> Option<QuizResult> {
        self.shared.lock().session.result().cloned()
    }

    /// Per-question seconds recorded so far.
    pub fn elapsed_seconds(&self) -> Vec<u64> {
        self.shared.lock().session.elapsed_seconds().to_vec()
    }

    pub fn is_timer_running(&self) -> bool {
        self.shared
            .lock()
            .countdown
            .as_ref()
            .is_some_and(|c| !c.is_cancelled())
    }

    /// Phase changes, including completion driven by the countdown.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.shared.phase_tx.subscribe()
    }

    // --- History ---

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.shared.lock().history.list().cloned().collect()
    }

    pub fn history_summary(&self) -> HistorySummary {
        self.shared.lock().history.summary()
    }

    pub fn clear_history(&self) -> Result<()> {
        let mut state = self.shared.lock();
        if let Some(conn) = &state.db {
            repository::clear_history(conn)?;
        }
        state.history.clear();
        info!("[History] Cleared");
        Ok(())
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            error!("[Engine] State mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn on_tick(&self, token: &CancellationToken, config: &EngineConfig) -> ControlFlow<()> {
        let mut state = self.lock();
        if token.is_cancelled() {
            return ControlFlow::Break(());
        }
        match state.session.tick() {
            TickOutcome::Running(left) => {
                debug!("[Timer] {}s left", left);
                ControlFlow::Continue(())
            }
            TickOutcome::Idle => ControlFlow::Break(()),
            TickOutcome::Expired => {
                info!("[Timer] Time is up, submitting");
                if let Err(e) = self.force_complete_locked(&mut state, config) {
                    warn!("[Timer] Could not finalize on expiry: {}", e);
                }
                ControlFlow::Break(())
            }
        }
    }

    /// `Some(result)` only for the call that actually finalized.
    fn force_complete_locked(
        &self,
        state: &mut EngineState,
        config: &EngineConfig,
    ) -> Result<Option<QuizResult>> {
        let fresh = state.session.force_complete_at(Instant::now())?;
        match &fresh {
            Some(result) => self.after_completion(state, result, config),
            None => {
                if let Some(countdown) = state.countdown.take() {
                    countdown.cancel();
                }
            }
        }
        Ok(fresh)
    }

    /// Finalize side effects: stop the countdown, log the attempt, notify.
    fn after_completion(&self, state: &mut EngineState, result: &QuizResult, config: &EngineConfig) {
        if let Some(countdown) = state.countdown.take() {
            countdown.cancel();
        }

        if let Some(definition) = state.session.definition().cloned() {
            let entry = state.history.record(
                &definition,
                result,
                state.session.answers(),
                state.session.elapsed_seconds(),
            );
            if let Some(conn) = &state.db {
                let limit = config.history_capacity();
                if let Err(e) = repository::save_history_entry(conn, &entry, limit) {
                    warn!("[History] Failed to persist entry {}: {}", entry.id, e);
                }
            }
        }

        self.phase_tx.send_replace(Phase::Completed);
    }
}
