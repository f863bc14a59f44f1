// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence boundary detection seam.
//!
//! Sentence segmentation is an external collaborator capability: the
//! engine only depends on the `SentenceSegmenter` trait. The bundled
//! `RuleSegmenter` is a punctuation-rule implementation good enough for
//! plain prose; a language-aware detector plugs in behind the same trait.

use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a document into sentence-sized text units.
pub trait SentenceSegmenter: Send + Sync {
    /// Returns the ordered, trimmed, non-empty sentences of `text`.
    ///
    /// A text with no detectable boundary is returned as a single unit.
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Sentence-terminal punctuation followed by whitespace, or a blank line.
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[.!?]['\x22)\]]*\s+)|(?:\n\s*\n)").expect("valid regex"));

/// Rule-based segmenter splitting on terminal punctuation and paragraph
/// breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleSegmenter;

impl RuleSegmenter {
    pub fn new() -> Self {
        Self
    }
}

impl SentenceSegmenter for RuleSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences: Vec<String> = Vec::new();
        let mut last = 0;

        for boundary in BOUNDARY.find_iter(text) {
            // Keep the terminal punctuation with the sentence, drop the
            // trailing whitespace.
            let end = boundary.end();
            let piece = text[last..end].trim();
            if !piece.is_empty() {
                sentences.push(piece.to_string());
            }
            last = end;
        }

        let tail = text[last..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }

        sentences
    }
}
