use std::collections::VecDeque;

use tracing::debug;

use super::classify::{Category, Line};
use super::identifier::Identifier;

/// Look-back lines kept while no block can claim them.
const LOOK_BACK_CAPACITY: usize = 8;
/// Trailing text on a repeated identifier line shorter than this is not taken
/// as the filled sentence.
const MIN_SENTENCE_CHARS: usize = 6;
pub const EXPLANATION_MARKER: char = '▶';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    SeekHeader,
    GatherNative,
    GatherQuestion,
    SeekAnswer,
    GatherExplanation,
}

impl SegmentState {
    /// Transition table for a non-identifier line arriving while a block is
    /// open: the next state and where the line is routed. `marker_seen` is
    /// whether the open block has passed an explanation marker.
    pub fn on_content(self, category: Category, marker_seen: bool) -> (Self, Route) {
        use Category::{LatinText, NativeText, Question};

        match (self, category) {
            (Self::SeekHeader, _) => (Self::SeekHeader, Route::LookBack),
            (Self::GatherNative, Question | LatinText) => (Self::GatherQuestion, Route::Prompt),
            (Self::GatherNative | Self::GatherQuestion, _) => (self, Route::Prompt),
            (Self::SeekAnswer, NativeText) => (Self::SeekAnswer, Route::Prompt),
            (Self::SeekAnswer, _) => (Self::GatherExplanation, Route::Answer),
            (Self::GatherExplanation, NativeText) if !marker_seen => {
                (Self::GatherExplanation, Route::LookBack)
            }
            (Self::GatherExplanation, _) => (Self::GatherExplanation, Route::Answer),
        }
    }

    pub fn in_answer_phase(self) -> bool {
        matches!(self, Self::SeekAnswer | Self::GatherExplanation)
    }
}

/// Destination of a content line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Held for the next header.
    LookBack,
    Prompt,
    Answer,
}

/// Where a block line arrived relative to the identifier repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Context,
    Prompt,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLine {
    pub category: Category,
    pub phase: Phase,
    pub text: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub sequence: usize,
    pub identifier: Identifier,
    pub lines: Vec<BlockLine>,
}

#[derive(Debug)]
struct OpenBlock {
    identifier: Identifier,
    lines: Vec<BlockLine>,
    marker_seen: bool,
}

#[derive(Debug)]
struct PendingLine {
    category: Category,
    text: String,
}

/// Single-pass block builder for one document.
#[derive(Debug)]
pub struct Segmenter {
    state: SegmentState,
    open: Option<OpenBlock>,
    look_back: VecDeque<PendingLine>,
    sealed: Vec<Block>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            state: SegmentState::SeekHeader,
            open: None,
            look_back: VecDeque::with_capacity(LOOK_BACK_CAPACITY),
            sealed: Vec::new(),
        }
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    pub fn push(&mut self, line: Line) {
        match line.category {
            Category::Empty | Category::Noise => {}
            Category::IdHeader | Category::IdAnswer => self.on_identifier(line),
            _ => self.on_content(line),
        }
    }

    pub fn finish(mut self) -> Vec<Block> {
        self.seal();
        self.sealed
    }

    fn on_identifier(&mut self, line: Line) {
        let Some(raw) = line.identifier else {
            self.on_content(line);
            return;
        };

        let previous = self
            .open
            .as_ref()
            .map(|open| open.identifier)
            .or_else(|| self.sealed.last().map(|block| block.identifier));
        let Some(identifier) = raw.resolve(previous) else {
            debug!(text = %line.text, "continuation marker without preceding block ignored");
            return;
        };

        let is_repetition = self
            .open
            .as_ref()
            .map(|open| open.identifier == identifier)
            .unwrap_or(false)
            && !self.state.in_answer_phase();

        if is_repetition {
            self.begin_answer(line);
            return;
        }

        if self.state.in_answer_phase()
            && self.open.as_ref().map(|open| open.identifier) == Some(identifier)
        {
            debug!(id = %identifier, "identifier seen again after its answer; opening duplicate block");
        }

        self.open_block(identifier);
        match line.category {
            Category::IdAnswer => self.begin_answer(line),
            _ => {
                if !line.text.is_empty() {
                    self.append(Category::NativeText, Phase::Prompt, line.text, line.highlights);
                }
                self.state = SegmentState::GatherNative;
            }
        }
    }

    fn begin_answer(&mut self, line: Line) {
        let inline_sentence = line.category == Category::IdAnswer
            && line.text.chars().count() >= MIN_SENTENCE_CHARS;

        if inline_sentence {
            if line.text.contains(EXPLANATION_MARKER) {
                self.mark_explanation();
            }
            self.append(Category::LatinText, Phase::Answer, line.text, line.highlights);
            self.state = SegmentState::GatherExplanation;
        } else {
            if !line.text.is_empty() {
                debug!(text = %line.text, "discarding short trailing text on repeated identifier");
            }
            self.state = SegmentState::SeekAnswer;
        }
    }

    fn on_content(&mut self, line: Line) {
        let Some(marker_seen) = self.open.as_ref().map(|open| open.marker_seen) else {
            self.remember(line);
            return;
        };

        let has_marker = line.text.contains(EXPLANATION_MARKER);
        let marker_seen =
            marker_seen || (has_marker && self.state == SegmentState::GatherExplanation);
        let (next, route) = self.state.on_content(line.category, marker_seen);
        self.state = next;

        match route {
            Route::LookBack => self.remember(line),
            Route::Prompt => {
                self.append(line.category, Phase::Prompt, line.text, line.highlights)
            }
            Route::Answer => {
                if has_marker {
                    self.mark_explanation();
                }
                self.append(line.category, Phase::Answer, line.text, line.highlights);
            }
        }
    }

    fn open_block(&mut self, identifier: Identifier) {
        self.seal();

        let context = self
            .look_back
            .drain(..)
            .filter(|pending| pending.category == Category::NativeText)
            .map(|pending| BlockLine {
                category: pending.category,
                phase: Phase::Context,
                text: pending.text,
                highlights: Vec::new(),
            })
            .collect();

        self.open = Some(OpenBlock {
            identifier,
            lines: context,
            marker_seen: false,
        });
    }

    fn seal(&mut self) {
        if let Some(open) = self.open.take() {
            self.sealed.push(Block {
                sequence: self.sealed.len(),
                identifier: open.identifier,
                lines: open.lines,
            });
        }
        self.state = SegmentState::SeekHeader;
    }

    fn append(&mut self, category: Category, phase: Phase, text: String, highlights: Vec<String>) {
        if let Some(open) = self.open.as_mut() {
            open.lines.push(BlockLine {
                category,
                phase,
                text,
                highlights,
            });
        }
    }

    fn mark_explanation(&mut self) {
        if let Some(open) = self.open.as_mut() {
            open.marker_seen = true;
        }
    }

    fn remember(&mut self, line: Line) {
        if self.look_back.len() == LOOK_BACK_CAPACITY {
            self.look_back.pop_front();
        }
        self.look_back.push_back(PendingLine {
            category: line.category,
            text: line.text,
        });
    }
}
