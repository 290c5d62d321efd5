use serde::Serialize;
use tracing::debug;

use super::answer::{AnswerOutcome, AnswerStrategy, extract_answer};
use super::identifier::Identifier;
use super::resolve::resolve_block;
use super::segment::Block;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub identifier: Identifier,
    pub native: String,
    pub filled_sentence: String,
    pub question: String,
    pub answer: AnswerOutcome,
    pub explanation: String,
}

impl Item {
    pub fn rendered_sentence(&self) -> String {
        self.answer.render(&self.filled_sentence)
    }

    /// Filled sentence recovered from the rendered form.
    pub fn restored_sentence(&self) -> Option<String> {
        self.answer.restore(&self.rendered_sentence())
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            id: self.identifier.to_string(),
            ja: self.native.clone(),
            en: self.rendered_sentence(),
            answer: self.answer.display_text().to_string(),
            answer_resolved: self.answer.is_resolved(),
            explanation: self.explanation.clone(),
            question: self.question.clone(),
        }
    }
}

/// Flat, serialisable form handed to templating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    pub id: String,
    pub ja: String,
    pub en: String,
    pub answer: String,
    pub answer_resolved: bool,
    pub explanation: String,
    pub question: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub lines_seen: usize,
    pub noise_lines: usize,
    pub blocks_sealed: usize,
    pub items_kept: usize,
    pub blocks_dropped: usize,
    pub highlight_answers: usize,
    pub blank_marker_answers: usize,
    pub common_affix_answers: usize,
    pub unresolved_answers: usize,
}

impl ExtractionStats {
    pub fn absorb(&mut self, other: &ExtractionStats) {
        self.lines_seen += other.lines_seen;
        self.noise_lines += other.noise_lines;
        self.blocks_sealed += other.blocks_sealed;
        self.items_kept += other.items_kept;
        self.blocks_dropped += other.blocks_dropped;
        self.highlight_answers += other.highlight_answers;
        self.blank_marker_answers += other.blank_marker_answers;
        self.common_affix_answers += other.common_affix_answers;
        self.unresolved_answers += other.unresolved_answers;
    }

    fn record_answer(&mut self, answer: &AnswerOutcome) {
        match answer {
            AnswerOutcome::Resolved { strategy, .. } => match strategy {
                AnswerStrategy::Highlight => self.highlight_answers += 1,
                AnswerStrategy::BlankMarker => self.blank_marker_answers += 1,
                AnswerStrategy::CommonAffix => self.common_affix_answers += 1,
            },
            AnswerOutcome::Unresolved => self.unresolved_answers += 1,
        }
    }
}

/// Builds items from sealed blocks, dropping blocks without a filled sentence,
/// and orders them by identifier. The sort is stable, so duplicate identifiers
/// keep their encounter order.
pub fn assemble_items(blocks: &[Block], stats: &mut ExtractionStats) -> Vec<Item> {
    let mut items = Vec::with_capacity(blocks.len());

    for block in blocks {
        stats.blocks_sealed += 1;
        let fields = resolve_block(block);
        if fields.filled_sentence.is_empty() {
            stats.blocks_dropped += 1;
            debug!(
                id = %block.identifier,
                sequence = block.sequence,
                "dropping block without filled sentence"
            );
            continue;
        }

        let answer = extract_answer(&fields.question, &fields.filled_sentence, &fields.highlights);
        stats.record_answer(&answer);

        items.push(Item {
            identifier: block.identifier,
            native: fields.native,
            filled_sentence: fields.filled_sentence,
            question: fields.question,
            answer,
            explanation: fields.explanation,
        });
    }

    items.sort_by_key(|item| item.identifier);
    stats.items_kept += items.len();
    items
}
