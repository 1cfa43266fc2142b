// src/timer.rs

use crate::error::{QuizError, Result};
use log::debug;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// A periodic task that runs one handler invocation at a time until the
/// handler breaks or the token is cancelled. Dropping it cancels it.
///
/// The handler receives the token so it can re-check cancellation after
/// acquiring whatever lock guards the state it mutates.
#[derive(Debug)]
pub struct Countdown {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// First tick fires one `period` after spawning. Fails outside a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Result<Self>
    where
        F: FnMut(&CancellationToken) -> ControlFlow<()> + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|_| QuizError::invalid_op("a timed quiz needs a running tokio runtime"))?;

        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!("[Timer] Countdown started ({:?} period)", period);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if task_token.is_cancelled() || on_tick(&task_token).is_break() {
                            break;
                        }
                    }
                }
            }
            debug!("[Timer] Countdown stopped");
        });

        Ok(Countdown {
            token,
            handle: Some(handle),
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Waits for the task to exit. Does not cancel it.
    pub async fn stopped(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
