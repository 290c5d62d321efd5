use anyhow::{Context, Result};
use regex::Regex;

use super::identifier::RawIdentifier;
use super::{SourceLine, contains_native_script, is_native_char};

const CHECKBOX_GLYPHS: &[char] = &['□', '☐'];
const TAG_LINES: &[&str] = &["基本", "発展"];
const MOJIBAKE_GLYPHS: &[char] = &['ʁ', 'Ͱ'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Empty,
    Noise,
    IdHeader,
    IdAnswer,
    Question,
    NativeText,
    LatinText,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Noise => "noise",
            Self::IdHeader => "id_header",
            Self::IdAnswer => "id_answer",
            Self::Question => "question",
            Self::NativeText => "native_text",
            Self::LatinText => "latin_text",
        }
    }
}

/// A classified input line. `text` is the content payload: the cleaned line,
/// or for identifier lines whatever follows the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub category: Category,
    pub text: String,
    pub identifier: Option<RawIdentifier>,
    pub highlights: Vec<String>,
}

impl Line {
    fn plain(category: Category, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            identifier: None,
            highlights: Vec::new(),
        }
    }
}

pub struct LineClassifier {
    footnote_line: Regex,
    footnote_prefix: Regex,
    tip_line: Regex,
    chapter_echo: Regex,
    page_pair: Regex,
    identifier_line: Regex,
    bracket_span: Regex,
    underscore_run: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            footnote_line: Regex::new(r"^F\s*\d+$").context("failed to compile footnote regex")?,
            footnote_prefix: Regex::new(r"^F\s*\d+\s+")
                .context("failed to compile footnote prefix regex")?,
            tip_line: Regex::new(r"^Tip\b").context("failed to compile tip regex")?,
            chapter_echo: Regex::new(r"(?i)^chapter\s*\d+")
                .context("failed to compile chapter echo regex")?,
            page_pair: Regex::new(r"^\d{1,4}\s+\d{1,4}$")
                .context("failed to compile page pair regex")?,
            identifier_line: Regex::new(
                r"^(?P<id>-?\d+(?:-\d+)?)(?:\s*[＝=])?(?:\s+(?P<rest>.+))?$",
            )
            .context("failed to compile identifier regex")?,
            bracket_span: Regex::new(r"[\(（\[［](?P<inner>[^\(（\[［\)）\]］]*)[\)）\]］]")
                .context("failed to compile bracket span regex")?,
            underscore_run: Regex::new(r"_{2,}").context("failed to compile underscore regex")?,
        })
    }

    pub fn classify(&self, source: &SourceLine) -> Line {
        let cleaned = strip_checkboxes(&source.text);
        let text = cleaned.trim();

        if text.is_empty() {
            return Line::plain(Category::Empty, "");
        }
        if self.is_noise(text) {
            return Line::plain(Category::Noise, text);
        }

        let highlights = emphasized_runs(source);

        if let Some(line) = self.classify_identifier_line(text, &highlights) {
            return line;
        }

        let content = self.footnote_prefix.replace(text, "").trim().to_string();
        let category = if self.has_blank_marker(&content) {
            Category::Question
        } else if contains_native_script(&content) {
            Category::NativeText
        } else {
            Category::LatinText
        };

        Line {
            category,
            text: content,
            identifier: None,
            highlights,
        }
    }

    fn is_noise(&self, text: &str) -> bool {
        self.footnote_line.is_match(text)
            || self.tip_line.is_match(text)
            || self.chapter_echo.is_match(text)
            || self.page_pair.is_match(text)
            || text.starts_with("Words to Use")
            || text.starts_with('○')
            || TAG_LINES.contains(&text)
            || text.contains(MOJIBAKE_GLYPHS)
    }

    fn classify_identifier_line(&self, text: &str, highlights: &[String]) -> Option<Line> {
        let captures = self.identifier_line.captures(text)?;
        let identifier = RawIdentifier::parse(captures.name("id")?.as_str())?;
        let rest = captures
            .name("rest")
            .map(|value| value.as_str().trim())
            .unwrap_or_default();
        let rest = self.footnote_prefix.replace(rest, "").trim().to_string();

        let category = if rest.is_empty() || contains_native_script(&rest) {
            Category::IdHeader
        } else {
            Category::IdAnswer
        };

        Some(Line {
            category,
            text: rest,
            identifier: Some(identifier),
            highlights: highlights.to_vec(),
        })
    }

    /// Parenthesized/bracketed spans, possibly empty, or underscore runs. On a
    /// line carrying native script only whitespace-only spans count, so glosses
    /// like `（植物）` stay native text.
    pub fn has_blank_marker(&self, text: &str) -> bool {
        if self.underscore_run.is_match(text) {
            return true;
        }

        let native_line = contains_native_script(text);
        self.bracket_span.captures_iter(text).any(|captures| {
            let inner = captures
                .name("inner")
                .map(|value| value.as_str())
                .unwrap_or_default();
            if native_line {
                inner.trim().is_empty()
            } else {
                !inner.chars().any(is_native_char)
            }
        })
    }
}

fn strip_checkboxes(text: &str) -> String {
    text.chars()
        .filter(|character| !CHECKBOX_GLYPHS.contains(character))
        .collect()
}

fn emphasized_runs(source: &SourceLine) -> Vec<String> {
    source
        .spans
        .iter()
        .filter(|span| span.emphasized && !is_decorative_run(&span.text))
        .map(|span| span.text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Whitespace and arrow/bullet runs are painted in accent colors by the
/// typesetter but never carry answer text.
fn is_decorative_run(text: &str) -> bool {
    text.chars()
        .all(|character| character.is_whitespace() || matches!(character, '➡' | '・' | '→'))
}
