//! Navigation Coordinator: serializes level changes and drives transforms.
//!
//! ```text
//! navigate(direction)
//!   Idle? no  → Busy (input dropped, not queued)
//!   Idle → Clamping
//!     boundary            → Idle, Boundary
//!     cache hit (opt-in)  → commit, Idle, Cached
//!   Clamping → Transforming   (display cleared, partials stream in)
//!   Transforming → Committing
//!     ok  → advance index, cache[to] = text
//!     err → stay, display reverts, last_error set
//!   Committing → Idle
//! ```
//!
//! The lock is never held across the transform await, so a second
//! `navigate` call during a transform observes `Transforming` and returns
//! `Busy` without touching the transformer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ladder::{Direction, Ladder, LadderError, LadderState, Level, NavState, StateMachine};
use tracing::{error, info, warn};

use crate::config::LadderKind;
use crate::errors::TransformError;
use crate::transformer::Transformer;

/// Seed text for the text ladder.
pub const TEXT_SEED: &str = "The mitochondria is the powerhouse of the cell";
/// Seed text for the multimodal ladder.
pub const MULTIMODAL_SEED: &str = "A corgi running in a grassy field.";

/// Initial session state for `kind`.
pub fn seed_state(kind: LadderKind) -> Result<LadderState, LadderError> {
    match kind {
        LadderKind::Text => {
            LadderState::new(Ladder::text(), Level::Sentence, TEXT_SEED)?.with_cached(Level::Emoji, "🌱")
        }
        LadderKind::Multimodal => LadderState::new(Ladder::multimodal(), Level::Text, MULTIMODAL_SEED),
    }
}

/// What a single directional input did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Transformed and advanced one level.
    Moved { from: Level, to: Level, text: String },
    /// Advanced using the cached content (only with `reuse_cached`).
    Cached { from: Level, to: Level, text: String },
    /// Already at the end of the ladder in that direction.
    Boundary,
    /// A transform was in flight; the input was dropped.
    Busy,
}

struct Inner {
    state: LadderState,
    machine: StateMachine,
}

impl Inner {
    fn advance(&mut self, to: NavState, reason: Option<&str>) {
        if let Err(e) = self.machine.advance(to, reason) {
            error!(error = %e, "Navigation state machine out of sync");
            debug_assert!(false, "{e}");
        }
    }
}

pub struct Navigator<T: Transformer> {
    transformer: T,
    reuse_cached: bool,
    inner: Mutex<Inner>,
}

impl<T: Transformer> Navigator<T> {
    pub fn new(state: LadderState, transformer: T) -> Self {
        Self {
            transformer,
            reuse_cached: false,
            inner: Mutex::new(Inner {
                state,
                machine: StateMachine::new(),
            }),
        }
    }

    /// Serve cached levels instead of re-transforming. Cached text is not
    /// invalidated when an upstream level is edited.
    pub fn with_reuse_cached(mut self, reuse: bool) -> Self {
        self.reuse_cached = reuse;
        self
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // State is only mutated in short, non-panicking sections.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the session state for rendering.
    pub fn snapshot(&self) -> LadderState {
        self.lock().state.clone()
    }

    pub fn nav_state(&self) -> NavState {
        self.lock().machine.current()
    }

    pub fn is_busy(&self) -> bool {
        !self.nav_state().accepts_input()
    }

    /// Human-readable transition history.
    pub fn history(&self) -> String {
        self.lock().machine.summary()
    }

    /// Replace the current level's content. Refused while transforming.
    pub fn edit(&self, text: impl Into<String>) -> bool {
        let mut inner = self.lock();
        if !inner.machine.is_idle() {
            warn!("Edit dropped: transform in flight");
            return false;
        }
        inner.state.edit(text);
        true
    }

    /// Handle one directional input.
    ///
    /// # Errors
    ///
    /// The transformer's error, exactly once, after the state has been
    /// reverted to the pre-attempt level and content.
    pub async fn navigate(
        &self,
        direction: Direction,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<NavigationOutcome, TransformError> {
        let (from, to, target_index, source) = {
            let mut inner = self.lock();
            let current_state = inner.machine.current();
            if !current_state.accepts_input() {
                warn!(direction = %direction, state = %current_state, "Input dropped: transform in flight");
                return Ok(NavigationOutcome::Busy);
            }
            inner.advance(NavState::Clamping, None);

            let current = inner.state.current_index();
            let from = inner.state.current_level();
            let Some((target_index, to)) = inner.state.ladder().target(current, direction) else {
                inner.advance(NavState::Idle, Some("boundary"));
                return Ok(NavigationOutcome::Boundary);
            };

            if self.reuse_cached {
                if let Some(text) = inner.state.cached(to).map(String::from) {
                    let committed = inner.state.commit(target_index, text.clone());
                    inner.advance(NavState::Idle, Some("cache hit"));
                    if committed.is_ok() {
                        info!(from = %from, to = %to, "Served cached level");
                        return Ok(NavigationOutcome::Cached { from, to, text });
                    }
                    inner.advance(NavState::Clamping, None);
                }
            }

            let reason = format!("{from} → {to}");
            inner.advance(NavState::Transforming, Some(&reason));
            inner.state.clear_error();
            inner.state.set_display("");
            (from, to, target_index, inner.state.current_content().to_string())
        };

        let mut guard = InFlight {
            inner: &self.inner,
            armed: true,
        };

        let result = {
            let mut relay = |partial: &str| {
                if !partial.trim().is_empty() {
                    self.lock().state.set_display(partial);
                }
                on_partial(partial);
            };
            self.transformer.transform(&source, from, to, &mut relay).await
        };
        guard.armed = false;

        let mut inner = self.lock();
        inner.advance(NavState::Committing, None);
        let outcome = match result {
            Ok(text) => match inner.state.commit(target_index, text.clone()) {
                Ok(_) => Ok(NavigationOutcome::Moved { from, to, text }),
                Err(e) => {
                    let err = TransformError::Configuration(e.to_string());
                    inner.state.revert(err.user_message());
                    Err(err)
                }
            },
            Err(e) => {
                warn!(from = %from, to = %to, error = %e, "Transform failed; staying at current level");
                inner.state.revert(e.user_message());
                Err(e)
            }
        };
        inner.advance(NavState::Idle, None);
        outcome
    }
}

/// Returns the machine to `Idle` if a navigation future is dropped mid-transform.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.advance(NavState::Committing, Some("abandoned"));
        let restored = inner.state.current_content().to_string();
        inner.state.set_display(restored);
        inner.advance(NavState::Idle, None);
    }
}
