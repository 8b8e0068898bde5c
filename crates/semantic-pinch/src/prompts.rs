//! Per-level instructions sent to the text-generation backend.
//!
//! The lookup is an exhaustive `match` over `Level`, so adding a level without
//! deciding its instruction is a compile error rather than a runtime miss.

use ladder::Level;

/// System prompt for the OpenAI-compatible backend.
pub const SYSTEM_PROMPT: &str = "You are a semantic transformation expert that converts text \
between different levels of detail. Return only plain text without any formatting, markdown, \
or special characters.";

const TO_EMOJI: &str = "Convert this text to a single emoji that best represents its meaning. \
Return ONLY the emoji, nothing else:";

const TO_WORD: &str = "Convert this text to a single word that best captures its essence. \
Return ONLY the word, nothing else:";

const TO_SENTENCE: &str = "Convert this text into a short sentence but longer than three words. \
Return ONLY the sentence, no markdown or special characters:";

const TO_PARAGRAPH: &str = "Convert this text into a short paragraph with three sentences. \
Return ONLY the paragraph text, no markdown or special characters:";

const TO_ARTICLE: &str = "Convert this text into a succinct well-structured article with a short \
punchy title and two paragraphs. Use two newlines between paragraphs for spacing. Use plain text \
only, no markdown, no special characters. Format example:\nTitle\n\nFirst paragraph...\n\nSecond \
paragraph...";

/// The instruction for producing `level`, or `None` if the text backend
/// cannot produce it.
pub fn instruction(level: Level) -> Option<&'static str> {
    match level {
        Level::Emoji => Some(TO_EMOJI),
        Level::Word => Some(TO_WORD),
        Level::Sentence | Level::Text => Some(TO_SENTENCE),
        Level::Paragraph => Some(TO_PARAGRAPH),
        Level::Article => Some(TO_ARTICLE),
        Level::Image => None,
    }
}

/// User message body: instruction, blank line, then the source text.
pub fn user_message(instruction: &str, content: &str) -> String {
    format!("{instruction}\n\nText: {content}")
}
