use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Presentational state of the submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Initial,
    Processing,
    Success,
    Error,
}

impl ButtonState {
    pub fn label(self) -> &'static str {
        match self {
            ButtonState::Initial => "Send",
            ButtonState::Processing => "",
            ButtonState::Success => "Sent",
            ButtonState::Error => "Error",
        }
    }

    pub fn icon(self) -> Option<&'static str> {
        match self {
            ButtonState::Processing => Some("icon-rotating icon-budicon-330"),
            ButtonState::Success => Some("btn-icon icon-budicon-390"),
            ButtonState::Initial | ButtonState::Error => None,
        }
    }

    pub fn classes(self) -> &'static [&'static str] {
        match self {
            ButtonState::Initial => &["btn-success"],
            ButtonState::Processing => &["btn-loading"],
            ButtonState::Success => &["btn-success", "success", "tada"],
            ButtonState::Error => &["btn-danger", "shake"],
        }
    }

    /// How long this state is shown before falling back to `Initial`.
    pub fn revert_after(self) -> Option<Duration> {
        match self {
            ButtonState::Success => Some(SUCCESS_REVERT),
            ButtonState::Error => Some(ERROR_REVERT),
            ButtonState::Initial | ButtonState::Processing => None,
        }
    }

    pub fn can_transition(self, to: ButtonState) -> bool {
        use ButtonState::*;
        matches!(
            (self, to),
            (Initial, Processing)
                | (Initial, Error)
                | (Processing, Success)
                | (Processing, Error)
                | (Success, Initial)
                | (Success, Processing)
                | (Success, Error)
                | (Error, Initial)
                | (Error, Processing)
                | (Error, Error)
        )
    }
}

pub const SUCCESS_REVERT: Duration = Duration::from_secs(3);
pub const ERROR_REVERT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("button cannot go from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ButtonState,
    pub to: ButtonState,
}

#[derive(Default)]
struct RevertTimer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

/// Submit button with at most one pending auto-revert.
///
/// Every transition bumps a generation counter and aborts the pending
/// revert under the same lock, so a stale timer can never overwrite a
/// newer state. Must be driven from inside a tokio runtime.
pub struct SubmitButton {
    state: Arc<watch::Sender<ButtonState>>,
    timer: Arc<Mutex<RevertTimer>>,
}

impl SubmitButton {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ButtonState::Initial);
        Self {
            state: Arc::new(tx),
            timer: Arc::new(Mutex::new(RevertTimer::default())),
        }
    }

    pub fn state(&self) -> ButtonState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ButtonState> {
        self.state.subscribe()
    }

    pub fn transition(&self, to: ButtonState) -> Result<(), InvalidTransition> {
        apply(&self.state, &self.timer, to)
    }

    /// Guard for an in-flight submission. Unless disarmed, dropping it moves
    /// a button still in `Processing` to `Error`, so a cancelled submit
    /// cannot leave the button stuck.
    pub fn processing_guard(&self) -> ProcessingGuard {
        ProcessingGuard {
            state: Arc::clone(&self.state),
            timer: Arc::clone(&self.timer),
            armed: true,
        }
    }
}

pub struct ProcessingGuard {
    state: Arc<watch::Sender<ButtonState>>,
    timer: Arc<Mutex<RevertTimer>>,
    armed: bool,
}

impl ProcessingGuard {
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if !self.armed || *self.state.borrow() != ButtonState::Processing {
            return;
        }
        tracing::debug!("Submission dropped while processing");
        if tokio::runtime::Handle::try_current().is_ok() {
            let _ = apply(&self.state, &self.timer, ButtonState::Error);
        } else {
            // No runtime to run the revert timer on.
            lock(&self.timer).generation += 1;
            self.state.send_replace(ButtonState::Initial);
        }
    }
}

fn apply(
    state: &Arc<watch::Sender<ButtonState>>,
    shared: &Arc<Mutex<RevertTimer>>,
    to: ButtonState,
) -> Result<(), InvalidTransition> {
    let mut timer = lock(shared);
    let from = *state.borrow();
    if !from.can_transition(to) {
        return Err(InvalidTransition { from, to });
    }

    timer.generation += 1;
    if let Some(pending) = timer.pending.take() {
        pending.abort();
    }
    state.send_replace(to);
    tracing::debug!(?from, ?to, "Submit button transition");

    if let Some(delay) = to.revert_after() {
        let generation = timer.generation;
        let state = Arc::clone(state);
        let shared = Arc::clone(shared);
        timer.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut timer = lock(&shared);
            if timer.generation == generation {
                timer.generation += 1;
                timer.pending = None;
                state.send_replace(ButtonState::Initial);
                tracing::debug!(from = ?to, "Submit button reverted");
            }
        }));
    }
    Ok(())
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SubmitButton {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.timer).pending.take() {
            pending.abort();
        }
    }
}

fn lock(timer: &Mutex<RevertTimer>) -> std::sync::MutexGuard<'_, RevertTimer> {
    timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
