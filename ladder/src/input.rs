//! Discrete directional input from keys and pinch gestures.

use crate::ladder::Direction;

/// Minimum change in finger distance (px) that counts as a pinch.
pub const PINCH_THRESHOLD: f64 = 50.0;

/// Map a key name to a direction. Unrelated keys yield `None`.
pub fn direction_for_key(key: &str) -> Option<Direction> {
    match key.trim() {
        "ArrowUp" | "Up" | "up" | "k" => Some(Direction::Up),
        "ArrowDown" | "Down" | "down" | "j" => Some(Direction::Down),
        _ => None,
    }
}

/// Turns a stream of two-finger distances into at most one direction per gesture.
///
/// Spreading the fingers moves toward detail (`Down`), squeezing moves toward
/// abstraction (`Up`).
#[derive(Debug, Clone)]
pub struct PinchTracker {
    start: Option<f64>,
    threshold: f64,
}

impl PinchTracker {
    pub fn new() -> Self {
        Self::with_threshold(PINCH_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            start: None,
            threshold,
        }
    }

    /// Two fingers touched down `distance` px apart.
    pub fn start(&mut self, distance: f64) {
        self.start = Some(distance);
    }

    /// Fingers moved; returns a direction once the threshold is crossed.
    pub fn update(&mut self, distance: f64) -> Option<Direction> {
        let start = self.start?;
        let delta = distance - start;
        if delta.abs() <= self.threshold {
            return None;
        }
        // One event per gesture.
        self.start = None;
        Some(if delta > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        })
    }

    pub fn end(&mut self) {
        self.start = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }
}

impl Default for PinchTracker {
    fn default() -> Self {
        Self::new()
    }
}
