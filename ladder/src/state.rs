//! Session state: where on the ladder we are and what each level last said.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LadderError;
use crate::ladder::Ladder;
use crate::level::Level;

/// The single mutable session state, owned by the navigator.
///
/// `current_index` is always a valid index into `ladder`, and `content` always
/// holds a value for the current level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLadderState")]
pub struct LadderState {
    ladder: Ladder,
    current_index: usize,
    /// Overwrite-on-write cache: level → last resolved string.
    content: BTreeMap<Level, String>,
    /// What the user currently sees; may hold a streaming partial.
    display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

#[derive(Deserialize)]
struct RawLadderState {
    ladder: Ladder,
    current_index: usize,
    content: BTreeMap<Level, String>,
    display: String,
    #[serde(default)]
    last_error: Option<String>,
}

impl TryFrom<RawLadderState> for LadderState {
    type Error = LadderError;

    fn try_from(raw: RawLadderState) -> Result<Self, Self::Error> {
        let current = raw.ladder.level(raw.current_index)?;
        if let Some(stray) = raw.content.keys().find(|l| raw.ladder.index_of(**l).is_err()) {
            return Err(LadderError::UnknownLevel(stray.to_string()));
        }
        if !raw.content.contains_key(&current) {
            return Err(LadderError::MissingContent(current));
        }
        Ok(Self {
            ladder: raw.ladder,
            current_index: raw.current_index,
            content: raw.content,
            display: raw.display,
            last_error: raw.last_error,
        })
    }
}

impl LadderState {
    /// Seed a session at `level` showing `text`.
    pub fn new(ladder: Ladder, level: Level, text: impl Into<String>) -> Result<Self, LadderError> {
        let current_index = ladder.index_of(level)?;
        let text = text.into();
        let mut content = BTreeMap::new();
        content.insert(level, text.clone());
        Ok(Self {
            ladder,
            current_index,
            content,
            display: text,
            last_error: None,
        })
    }

    /// Pre-populate the cache for a level other than the current one.
    pub fn with_cached(mut self, level: Level, text: impl Into<String>) -> Result<Self, LadderError> {
        self.ladder.index_of(level)?;
        if level != self.current_level() {
            self.content.insert(level, text.into());
        }
        Ok(self)
    }

    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_level(&self) -> Level {
        self.ladder.levels()[self.current_index]
    }

    /// Last resolved content at the current level.
    pub fn current_content(&self) -> &str {
        self.content
            .get(&self.current_level())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn cached(&self, level: Level) -> Option<&str> {
        self.content.get(&level).map(String::as_str)
    }

    pub fn cache(&self) -> &BTreeMap<Level, String> {
        &self.content
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replace the displayed text (streaming partials).
    pub fn set_display(&mut self, text: impl Into<String>) {
        self.display = text.into();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Move to `index` and record `text` as that level's content.
    pub fn commit(&mut self, index: usize, text: impl Into<String>) -> Result<Level, LadderError> {
        let level = self.ladder.level(index)?;
        let text = text.into();
        self.current_index = index;
        self.display = text.clone();
        self.content.insert(level, text);
        self.last_error = None;
        Ok(level)
    }

    /// Stay put, restore the last good content, and remember `message`.
    pub fn revert(&mut self, message: impl Into<String>) {
        self.display = self.current_content().to_string();
        self.last_error = Some(message.into());
    }

    /// Overwrite the current level's content in place (user edit).
    pub fn edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.display = text.clone();
        self.content.insert(self.current_level(), text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> LadderState {
        LadderState::new(Ladder::text(), Level::Sentence, "The cell has a powerhouse.")
            .unwrap()
            .with_cached(Level::Emoji, "🌱")
            .unwrap()
    }

    #[test]
    fn seed_sets_index_content_and_display() {
        let state = seeded();
        assert_eq!(state.current_index(), 2);
        assert_eq!(state.current_level(), Level::Sentence);
        assert_eq!(state.current_content(), "The cell has a powerhouse.");
        assert_eq!(state.display(), state.current_content());
        assert_eq!(state.cached(Level::Emoji), Some("🌱"));
        assert!(state.last_error().is_none());
    }

    #[test]
    fn seed_rejects_level_off_ladder() {
        let err = LadderState::new(Ladder::text(), Level::Image, "x").unwrap_err();
        assert!(matches!(err, LadderError::UnknownLevel(_)));
    }

    #[test]
    fn commit_advances_and_overwrites_cache() {
        let mut state = seeded();
        state.commit(3, "First. Second. Third.").unwrap();
        assert_eq!(state.current_level(), Level::Paragraph);
        assert_eq!(state.display(), "First. Second. Third.");

        state.commit(3, "Replaced.").unwrap();
        assert_eq!(state.cached(Level::Paragraph), Some("Replaced."));
    }

    #[test]
    fn commit_out_of_range_leaves_state() {
        let mut state = seeded();
        assert!(state.commit(7, "nope").is_err());
        assert_eq!(state.current_index(), 2);
    }

    #[test]
    fn revert_restores_display_and_records_error() {
        let mut state = seeded();
        state.set_display("partial garb");
        state.revert("Failed to transform content. Please try again.");
        assert_eq!(state.display(), "The cell has a powerhouse.");
        assert_eq!(
            state.last_error(),
            Some("Failed to transform content. Please try again.")
        );

        state.commit(1, "Powerhouse").unwrap();
        assert!(state.last_error().is_none());
    }

    #[test]
    fn deserialize_round_trips_valid_state() {
        let state = seeded();
        let json = serde_json::to_string(&state).unwrap();
        let back: LadderState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn deserialize_rejects_inconsistent_state() {
        let off_ladder = r#"{"ladder":{"levels":["word"]},"current_index":7,
            "content":{"word":"Power"},"display":"Power"}"#;
        assert!(serde_json::from_str::<LadderState>(off_ladder).is_err());

        let stray_level = r#"{"ladder":{"levels":["word"]},"current_index":0,
            "content":{"word":"Power","image":"x"},"display":"Power"}"#;
        assert!(serde_json::from_str::<LadderState>(stray_level).is_err());

        let no_content = r#"{"ladder":{"levels":["word","emoji"]},"current_index":1,
            "content":{"word":"Power"},"display":""}"#;
        assert!(serde_json::from_str::<LadderState>(no_content).is_err());
    }

    #[test]
    fn edit_overwrites_current_level() {
        let mut state = seeded();
        state.edit("Mitochondria make ATP.");
        assert_eq!(state.current_content(), "Mitochondria make ATP.");
        assert_eq!(state.display(), "Mitochondria make ATP.");
        assert_eq!(state.current_index(), 2);
    }
}
