//! Navigation State Machine: explicit states and legal transition guards.
//!
//! One navigation attempt walks `Idle → Clamping → Transforming → Committing
//! → Idle`, or short-circuits `Clamping → Idle` at a ladder boundary (or on a
//! cache hit). Only `Idle` accepts directional input, so at most one transform
//! is ever in flight.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The set of navigation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    /// Waiting for directional input.
    Idle,
    /// Computing the clamped target level.
    Clamping,
    /// A transform is in flight; further input is dropped.
    Transforming,
    /// Applying the transform result (or reverting on failure).
    Committing,
}

impl NavState {
    /// Whether directional input is accepted in this state.
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Clamping => write!(f, "Clamping"),
            Self::Transforming => write!(f, "Transforming"),
            Self::Committing => write!(f, "Committing"),
        }
    }
}

/// Legal transitions between navigation states.
///
/// ```text
/// Idle → Clamping
/// Clamping → Transforming | Idle
/// Transforming → Committing
/// Committing → Idle
/// ```
fn is_legal_transition(from: NavState, to: NavState) -> bool {
    use NavState::*;

    matches!(
        (from, to),
        (Idle, Clamping)
            | (Clamping, Transforming)
            // Boundary or cache hit: nothing to transform
            | (Clamping, Idle)
            | (Transforming, Committing)
            | (Committing, Idle)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: NavState,
    pub to: NavState,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal navigation transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: NavState,
    pub to: NavState,
}

/// The navigation state machine.
///
/// Tracks the current state, enforces legal transitions, and keeps a log of
/// every transition for diagnostics.
/// Transition records kept for diagnostics; older ones are discarded.
pub const TRANSITION_LOG_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct StateMachine {
    current: NavState,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
    total_transitions: usize,
}

impl StateMachine {
    /// Create a new state machine in `Idle`.
    pub fn new() -> Self {
        Self {
            current: NavState::Idle,
            created_at: Instant::now(),
            transitions: Vec::new(),
            total_transitions: 0,
        }
    }

    pub fn current(&self) -> NavState {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current == NavState::Idle
    }

    /// Attempt to advance to the next state.
    pub fn advance(&mut self, to: NavState, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(from = %self.current, to = %to, "Navigation transition");

        if self.transitions.len() == TRANSITION_LOG_CAPACITY {
            self.transitions.remove(0);
        }
        self.transitions.push(record);
        self.total_transitions += 1;
        self.current = to;
        Ok(())
    }

    /// The most recent transitions, oldest first.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Transitions since creation, including those dropped from the log.
    pub fn total_transitions(&self) -> usize {
        self.total_transitions
    }

    /// "Idle → Clamping → Transforming → Committing → Idle (4 transitions)"
    ///
    /// The path covers the retained log; the count covers the whole session.
    pub fn summary(&self) -> String {
        let start = self.transitions.first().map_or(self.current, |t| t.from);
        let mut path = vec![start.to_string()];
        path.extend(self.transitions.iter().map(|t| t.to.to_string()));
        format!("{} ({} transitions)", path.join(" → "), self.total_transitions)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
