//! Line-to-item extraction for drill chapters.
//!
//! Stages run strictly in order: classify each line, segment classified lines
//! into per-identifier blocks, resolve block fields, extract the answer span,
//! then assemble and order items. Every stage is deterministic and owns its
//! state for the duration of one document.

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod answer;
mod assemble;
mod classify;
mod identifier;
mod resolve;
mod segment;
#[cfg(test)]
mod tests;

pub use answer::{AnswerOutcome, AnswerStrategy, UNRESOLVED_MARKER, extract_answer};
pub use assemble::{ExtractionStats, Item, ItemRecord, assemble_items};
pub use classify::{Category, Line, LineClassifier};
pub use identifier::{Identifier, RawIdentifier};
pub use resolve::{ResolvedFields, resolve_block};
pub use segment::{Block, BlockLine, Phase, Route, SegmentState, Segmenter};

/// One line handed over by a document adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    pub text: String,
    #[serde(default)]
    pub spans: Vec<SourceSpan>,
}

impl SourceLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }
}

/// A formatting run within a line. `emphasized` is set by the adapter for runs
/// painted in a non-default, non-background color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub text: String,
    #[serde(default)]
    pub emphasized: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentExtraction {
    pub items: Vec<Item>,
    pub stats: ExtractionStats,
}

/// Shared read-only across worker threads; each `extract` call owns its
/// segmenter.
pub struct Extractor {
    classifier: LineClassifier,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new()?,
        })
    }

    pub fn extract(&self, lines: &[SourceLine]) -> DocumentExtraction {
        let mut segmenter = Segmenter::new();
        let mut stats = ExtractionStats::default();

        for source in lines {
            let line = self.classifier.classify(source);
            stats.lines_seen += 1;
            if line.category == Category::Noise {
                stats.noise_lines += 1;
            }
            segmenter.push(line);
        }

        let blocks = segmenter.finish();
        let items = assemble_items(&blocks, &mut stats);

        DocumentExtraction { items, stats }
    }
}

pub fn is_native_char(character: char) -> bool {
    matches!(
        character,
        '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{31F0}'..='\u{31FF}'
            | '\u{FF66}'..='\u{FF9F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}'
    )
}

pub fn contains_native_script(text: &str) -> bool {
    text.chars().any(is_native_char)
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Sentence ends in `.`, `?` or `!`, optionally followed by closing quotes.
pub fn is_fully_formed(text: &str) -> bool {
    let trimmed = text
        .trim_end()
        .trim_end_matches(['"', '\'', '”', '’', ')', '）']);
    trimmed.ends_with(['.', '?', '!'])
}
