//! Flush policy for streamed text.
//!
//! Every fragment is appended to the full response; the policy only decides
//! *when* the accumulated text is surfaced. A surfaced value is always the
//! entire response so far, so successive values are prefix-extensions of one
//! another.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A sentence terminator followed by whitespace.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s").expect("SENTENCE_END regex should compile"));

const PARAGRAPH_BREAK: &str = "\n\n";

/// When pending streamed text is surfaced to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Short atomic outputs (emoji, word): surface every fragment.
    EveryFragment,
    /// Single-paragraph prose: surface once a sentence has ended.
    SentenceEnd,
    /// Multi-paragraph structured output: surface at each blank line.
    ParagraphBreak,
}

impl FlushPolicy {
    /// Whether `pending` (the not-yet-surfaced text) should be flushed now.
    pub fn should_flush(self, pending: &str) -> bool {
        match self {
            Self::EveryFragment => !pending.is_empty(),
            Self::SentenceEnd => SENTENCE_END.is_match(pending),
            Self::ParagraphBreak => pending.contains(PARAGRAPH_BREAK),
        }
    }
}

/// Two accumulators: the never-truncated response and the un-surfaced tail.
#[derive(Debug, Clone)]
pub struct FlushBuffer {
    policy: FlushPolicy,
    full: String,
    pending: String,
    fragments: usize,
    flushes: usize,
}

impl FlushBuffer {
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            full: String::new(),
            pending: String::new(),
            fragments: 0,
            flushes: 0,
        }
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Append one fragment in arrival order.
    ///
    /// Returns the full response when the policy says to surface it. Empty
    /// fragments are ignored.
    pub fn push(&mut self, fragment: &str) -> Option<&str> {
        if fragment.is_empty() {
            return None;
        }
        self.fragments += 1;
        self.full.push_str(fragment);
        self.pending.push_str(fragment);

        if self.policy.should_flush(&self.pending) {
            self.pending.clear();
            self.flushes += 1;
            Some(&self.full)
        } else {
            None
        }
    }

    /// End of stream: surface the residual text, if any was held back.
    pub fn finish(&mut self) -> Option<&str> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.clear();
        self.flushes += 1;
        Some(&self.full)
    }

    /// Everything received so far.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Text received but not yet surfaced.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Number of non-empty fragments appended.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Number of times the full response was surfaced.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn into_text(self) -> String {
        self.full
    }
}
