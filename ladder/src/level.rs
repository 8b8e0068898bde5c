//! Semantic levels: the rungs a piece of content can be rendered at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LadderError;
use crate::flush::FlushPolicy;

/// One rung of a semantic ladder.
///
/// Textual levels are produced by the text-generation backend; `Image` is
/// produced by the media backend and is only present in the multimodal ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// A single emoji.
    Emoji,
    /// A single word.
    Word,
    /// A short sentence, longer than three words.
    Sentence,
    /// A short three-sentence paragraph.
    Paragraph,
    /// A titled two-paragraph article.
    Article,
    /// Free-form caption text (multimodal ladder).
    Text,
    /// An image, represented by its URL.
    Image,
}

impl Level {
    /// All levels, in declaration order.
    pub const ALL: [Level; 7] = [
        Level::Emoji,
        Level::Word,
        Level::Sentence,
        Level::Paragraph,
        Level::Article,
        Level::Text,
        Level::Image,
    ];

    /// Wire name, as used in `toLevel` request fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emoji => "emoji",
            Self::Word => "word",
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
            Self::Article => "article",
            Self::Text => "text",
            Self::Image => "image",
        }
    }

    /// Whether content at this level is produced by the text backend.
    pub fn is_textual(self) -> bool {
        !matches!(self, Self::Image)
    }

    /// When streamed text targeting this level should be surfaced.
    pub fn flush_policy(self) -> FlushPolicy {
        match self {
            Self::Emoji | Self::Word => FlushPolicy::EveryFragment,
            Self::Article => FlushPolicy::ParagraphBreak,
            Self::Sentence | Self::Paragraph | Self::Text => FlushPolicy::SentenceEnd,
            // Media results arrive whole.
            Self::Image => FlushPolicy::EveryFragment,
        }
    }

    /// Capitalised label for display ("Sentence", "Image").
    pub fn label(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LadderError::UnknownLevel(s.to_string()))
    }
}
