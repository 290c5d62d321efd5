use std::ops::Range;

use super::normalize_whitespace;

/// Printed in place of the answer when no strategy locates a span.
pub const UNRESOLVED_MARKER: &str = "???";
const SPAN_SEPARATOR: &str = ", ";
const BLANK_OPENERS: &[char] = &['(', '（', '[', '［', '_'];
const BLANK_CLOSERS: &[char] = &[')', '）', ']', '］', '_'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStrategy {
    Highlight,
    BlankMarker,
    CommonAffix,
}

impl AnswerStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::BlankMarker => "blank_marker",
            Self::CommonAffix => "common_affix",
        }
    }
}

/// Answer located in a whitespace-normalised filled sentence. `spans` are
/// ascending, non-overlapping byte ranges into that sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Resolved {
        strategy: AnswerStrategy,
        spans: Vec<Range<usize>>,
        text: String,
    },
    Unresolved,
}

impl AnswerOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Resolved { text, .. } => Some(text),
            Self::Unresolved => None,
        }
    }

    pub fn strategy(&self) -> Option<AnswerStrategy> {
        match self {
            Self::Resolved { strategy, .. } => Some(*strategy),
            Self::Unresolved => None,
        }
    }

    pub fn display_text(&self) -> &str {
        self.text().unwrap_or(UNRESOLVED_MARKER)
    }

    /// Wraps every located span of `filled` in braces, once.
    pub fn render(&self, filled: &str) -> String {
        let Self::Resolved { spans, .. } = self else {
            return filled.to_string();
        };

        let mut rendered = String::with_capacity(filled.len() + spans.len() * 2);
        let mut cursor = 0usize;
        for span in spans {
            if span.start < cursor || span.end > filled.len() {
                continue;
            }
            rendered.push_str(&filled[cursor..span.start]);
            rendered.push('{');
            rendered.push_str(&filled[span.clone()]);
            rendered.push('}');
            cursor = span.end;
        }
        rendered.push_str(&filled[cursor..]);
        rendered
    }

    /// Inverse of `render`: unwraps each braced span in order. `None` when
    /// `rendered` does not carry this outcome's spans.
    pub fn restore(&self, rendered: &str) -> Option<String> {
        let Self::Resolved { spans, .. } = self else {
            return Some(rendered.to_string());
        };

        let mut restored = String::with_capacity(rendered.len());
        let mut rest = rendered;
        for span in spans {
            let open = rest.find('{')?;
            let close = open + 1 + span.len();
            if rest.get(close..close + 1) != Some("}") {
                return None;
            }
            restored.push_str(&rest[..open]);
            restored.push_str(&rest[open + 1..close]);
            rest = &rest[close + 1..];
        }
        restored.push_str(rest);
        Some(restored)
    }
}

pub fn extract_answer(question: &str, filled: &str, highlights: &[String]) -> AnswerOutcome {
    let question = normalize_whitespace(question);
    let filled = normalize_whitespace(filled);
    if filled.is_empty() {
        return AnswerOutcome::Unresolved;
    }

    if let Some(spans) = locate_highlights(&filled, highlights) {
        return resolved(AnswerStrategy::Highlight, &filled, spans);
    }

    if let Some(span) = blank_marker_span(&question, &filled) {
        return resolved(AnswerStrategy::BlankMarker, &filled, vec![span]);
    }

    if let Some(span) = common_affix_span(&question, &filled) {
        return resolved(AnswerStrategy::CommonAffix, &filled, vec![span]);
    }

    AnswerOutcome::Unresolved
}

fn resolved(strategy: AnswerStrategy, filled: &str, spans: Vec<Range<usize>>) -> AnswerOutcome {
    let text = spans
        .iter()
        .map(|span| &filled[span.clone()])
        .collect::<Vec<&str>>()
        .join(SPAN_SEPARATOR);
    AnswerOutcome::Resolved {
        strategy,
        spans,
        text,
    }
}

fn locate_highlights(filled: &str, highlights: &[String]) -> Option<Vec<Range<usize>>> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    for highlight in highlights {
        let needle = normalize_whitespace(highlight);
        if needle.is_empty() {
            continue;
        }
        if let Some(offset) = filled[cursor..].find(&needle) {
            let start = cursor + offset;
            spans.push(start..start + needle.len());
            cursor = start + needle.len();
        }
    }

    if spans.is_empty() { None } else { Some(spans) }
}

fn blank_marker_span(question: &str, filled: &str) -> Option<Range<usize>> {
    let open = question
        .char_indices()
        .find(|(_, character)| BLANK_OPENERS.contains(character))
        .map(|(index, _)| index)?;
    let close = question
        .char_indices()
        .rev()
        .find(|(_, character)| BLANK_CLOSERS.contains(character))
        .map(|(index, character)| index + character.len_utf8())?;
    if close <= open {
        return None;
    }

    let prefix = question[..open].trim();
    let suffix = question[close..].trim();

    let start = if prefix.is_empty() {
        0
    } else {
        filled
            .find(prefix)
            .map(|index| index + prefix.len())
            .unwrap_or(0)
    };
    let end = if suffix.is_empty() {
        filled.len()
    } else {
        filled.rfind(suffix).unwrap_or(filled.len())
    };
    if end <= start {
        return None;
    }

    trim_span(filled, start..end)
}

fn common_affix_span(question: &str, filled: &str) -> Option<Range<usize>> {
    let prefix_len = question
        .chars()
        .zip(filled.chars())
        .take_while(|(left, right)| left == right)
        .map(|(character, _)| character.len_utf8())
        .sum::<usize>();

    let suffix_limit = (question.len() - prefix_len).min(filled.len() - prefix_len);
    let mut suffix_len = 0usize;
    for (left, right) in question.chars().rev().zip(filled.chars().rev()) {
        if left != right || suffix_len + left.len_utf8() > suffix_limit {
            break;
        }
        suffix_len += left.len_utf8();
    }

    if prefix_len == 0 && suffix_len == 0 {
        return None;
    }
    if prefix_len + suffix_len >= filled.len() {
        return None;
    }

    trim_span(filled, prefix_len..filled.len() - suffix_len)
}

fn trim_span(text: &str, span: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[span.clone()];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    let trimmed = span.start + leading..span.end - trailing;
    if trimmed.start >= trimmed.end {
        None
    } else {
        Some(trimmed)
    }
}
