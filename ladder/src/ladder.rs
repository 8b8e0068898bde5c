//! The ordered level sequence and the adjacent-move arithmetic over it.
//!
//! All functions here are pure. Moving past either end of the ladder is a
//! silent no-op: the clamped index equals the current one and the caller
//! skips the transform entirely.

use serde::{Deserialize, Serialize};

use crate::error::LadderError;
use crate::level::Level;

/// A navigation step: one rung toward abstraction or toward detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward the more abstract end (index - 1).
    Up,
    /// Toward the more detailed end (index + 1).
    Down,
}

impl Direction {
    /// Signed index offset of this step.
    pub fn delta(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// A totally ordered, non-empty sequence of distinct levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLadder")]
pub struct Ladder {
    levels: Vec<Level>,
}

#[derive(Deserialize)]
struct RawLadder {
    levels: Vec<Level>,
}

impl TryFrom<RawLadder> for Ladder {
    type Error = LadderError;

    fn try_from(raw: RawLadder) -> Result<Self, Self::Error> {
        Self::new(raw.levels)
    }
}

impl Ladder {
    /// Build a ladder from an explicit ordering.
    ///
    /// # Errors
    ///
    /// `EmptyLadder` for an empty sequence, `DuplicateLevel` if a level repeats.
    pub fn new(levels: Vec<Level>) -> Result<Self, LadderError> {
        if levels.is_empty() {
            return Err(LadderError::EmptyLadder);
        }
        for (i, level) in levels.iter().enumerate() {
            if levels[..i].contains(level) {
                return Err(LadderError::DuplicateLevel(*level));
            }
        }
        Ok(Self { levels })
    }

    /// emoji → word → sentence → paragraph → article
    pub fn text() -> Self {
        Self {
            levels: vec![
                Level::Emoji,
                Level::Word,
                Level::Sentence,
                Level::Paragraph,
                Level::Article,
            ],
        }
    }

    /// emoji → text → image
    pub fn multimodal() -> Self {
        Self {
            levels: vec![Level::Emoji, Level::Text, Level::Image],
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.levels.len() - 1
    }

    /// Level at `index`.
    pub fn level(&self, index: usize) -> Result<Level, LadderError> {
        self.levels
            .get(index)
            .copied()
            .ok_or(LadderError::IndexOutOfRange {
                index,
                len: self.levels.len(),
            })
    }

    /// Index of `level` on this ladder.
    pub fn index_of(&self, level: Level) -> Result<usize, LadderError> {
        self.levels
            .iter()
            .position(|l| *l == level)
            .ok_or_else(|| LadderError::UnknownLevel(level.to_string()))
    }

    /// `max(0, min(last, current + direction))`.
    ///
    /// An index that is not on the ladder never moves.
    pub fn clamped_index(&self, current: usize, direction: Direction) -> usize {
        let last = self.last_index();
        if current > last {
            return current;
        }
        current.saturating_add_signed(direction.delta()).min(last)
    }

    /// True when a step in `direction` would not move.
    pub fn is_boundary(&self, current: usize, direction: Direction) -> bool {
        self.clamped_index(current, direction) == current
    }

    /// The level a step would land on, or `None` at a boundary.
    pub fn target(&self, current: usize, direction: Direction) -> Option<(usize, Level)> {
        if self.is_boundary(current, direction) {
            return None;
        }
        let index = self.clamped_index(current, direction);
        Some((index, self.levels[index]))
    }

    /// Whether `from` and `to` are neighbours on this ladder.
    pub fn are_adjacent(&self, from: Level, to: Level) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Ok(a), Ok(b)) => a.abs_diff(b) == 1,
            _ => false,
        }
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self::text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_ladder_order() {
        let ladder = Ladder::text();
        assert_eq!(ladder.len(), 5);
        assert_eq!(ladder.level(0).unwrap(), Level::Emoji);
        assert_eq!(ladder.level(4).unwrap(), Level::Article);
        assert_eq!(ladder.index_of(Level::Sentence).unwrap(), 2);
    }

    #[test]
    fn clamped_index_moves_one_step() {
        let ladder = Ladder::text();
        assert_eq!(ladder.clamped_index(2, Direction::Down), 3);
        assert_eq!(ladder.clamped_index(2, Direction::Up), 1);
    }

    #[test]
    fn clamped_index_noops_at_both_ends() {
        let ladder = Ladder::text();
        assert_eq!(ladder.clamped_index(0, Direction::Up), 0);
        assert_eq!(ladder.clamped_index(4, Direction::Down), 4);
        assert!(ladder.is_boundary(0, Direction::Up));
        assert!(ladder.is_boundary(4, Direction::Down));
        assert!(!ladder.is_boundary(0, Direction::Down));
        assert!(ladder.target(4, Direction::Down).is_none());
    }

    #[test]
    fn target_reports_level() {
        let ladder = Ladder::multimodal();
        assert_eq!(ladder.target(1, Direction::Down), Some((2, Level::Image)));
        assert_eq!(ladder.target(1, Direction::Up), Some((0, Level::Emoji)));
    }

    #[test]
    fn single_level_ladder_is_all_boundary() {
        let ladder = Ladder::new(vec![Level::Word]).unwrap();
        assert!(ladder.is_boundary(0, Direction::Up));
        assert!(ladder.is_boundary(0, Direction::Down));
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert_eq!(Ladder::new(vec![]).unwrap_err(), LadderError::EmptyLadder);
        assert_eq!(
            Ladder::new(vec![Level::Word, Level::Emoji, Level::Word]).unwrap_err(),
            LadderError::DuplicateLevel(Level::Word)
        );
    }

    #[test]
    fn level_out_of_range() {
        let err = Ladder::text().level(9).unwrap_err();
        assert_eq!(err, LadderError::IndexOutOfRange { index: 9, len: 5 });
    }

    #[test]
    fn off_ladder_index_is_a_boundary() {
        let ladder = Ladder::text();
        assert_eq!(ladder.clamped_index(10, Direction::Down), 10);
        assert!(ladder.is_boundary(10, Direction::Down));
        assert!(ladder.is_boundary(5, Direction::Up));
        assert_eq!(ladder.target(10, Direction::Down), None);
        assert_eq!(ladder.target(5, Direction::Up), None);
    }

    #[test]
    fn deserialize_validates_levels() {
        let ladder: Ladder = serde_json::from_str(r#"{"levels":["emoji","text","image"]}"#).unwrap();
        assert_eq!(ladder, Ladder::multimodal());

        assert!(serde_json::from_str::<Ladder>(r#"{"levels":[]}"#).is_err());
        assert!(serde_json::from_str::<Ladder>(r#"{"levels":["word","word"]}"#).is_err());
    }

    #[test]
    fn adjacency() {
        let ladder = Ladder::text();
        assert!(ladder.are_adjacent(Level::Sentence, Level::Paragraph));
        assert!(ladder.are_adjacent(Level::Paragraph, Level::Sentence));
        assert!(!ladder.are_adjacent(Level::Emoji, Level::Sentence));
        assert!(!ladder.are_adjacent(Level::Emoji, Level::Image));
    }
}
