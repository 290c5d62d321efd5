use super::classify::Category;
use super::segment::{Block, BlockLine, EXPLANATION_MARKER, Phase};
use super::{is_fully_formed, normalize_whitespace};

const NATIVE_TERMINATORS: &[char] = &['。', '？', '！'];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub native: String,
    pub question: String,
    pub filled_sentence: String,
    pub explanation: String,
    pub highlights: Vec<String>,
}

pub fn resolve_block(block: &Block) -> ResolvedFields {
    let native_lines = block
        .lines
        .iter()
        .filter(|line| line.phase != Phase::Answer && line.category == Category::NativeText)
        .map(|line| line.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<&str>>();
    let native = primary_sentence(&normalize_whitespace(&native_lines.join(" "))).to_string();

    let prompt_lines = block
        .lines
        .iter()
        .filter(|line| line.phase == Phase::Prompt)
        .collect::<Vec<&BlockLine>>();
    let question = resolve_question(&prompt_lines);

    let answer_lines = block
        .lines
        .iter()
        .filter(|line| line.phase == Phase::Answer)
        .collect::<Vec<&BlockLine>>();
    let (filled_sentence, explanation, highlights) = split_answer_lines(&answer_lines);

    ResolvedFields {
        native,
        question,
        filled_sentence,
        explanation,
        highlights,
    }
}

/// Keeps only the first native sentence; anything after it is a hint.
fn primary_sentence(text: &str) -> &str {
    let Some((index, terminator)) = text
        .char_indices()
        .find(|(_, character)| NATIVE_TERMINATORS.contains(character))
    else {
        return text;
    };

    let end = index + terminator.len_utf8();
    if text[end..].trim().is_empty() {
        text
    } else {
        &text[..end]
    }
}

fn resolve_question(prompt_lines: &[&BlockLine]) -> String {
    let start = prompt_lines
        .iter()
        .position(|line| line.category == Category::Question)
        .or_else(|| {
            prompt_lines
                .iter()
                .position(|line| line.category == Category::LatinText)
        });
    let Some(start) = start else {
        return String::new();
    };

    let mut parts = vec![prompt_lines[start].text.trim()];
    for line in &prompt_lines[start + 1..] {
        let current = parts.join(" ");
        let continues = match line.category {
            Category::Question => prompt_lines[start].category == Category::Question,
            Category::LatinText => !is_fully_formed(&current),
            _ => false,
        };
        if !continues {
            break;
        }
        parts.push(line.text.trim());
    }

    normalize_whitespace(&parts.join(" "))
}

fn split_answer_lines(answer_lines: &[&BlockLine]) -> (String, String, Vec<String>) {
    let mut filled = Vec::<&str>::new();
    let mut explanation = Vec::<String>::new();
    let mut highlights = Vec::<String>::new();
    let mut in_explanation = false;

    for line in answer_lines {
        let text = line.text.trim();
        if in_explanation {
            explanation.push(text.to_string());
            continue;
        }

        if let Some((before, after)) = text.split_once(EXPLANATION_MARKER) {
            let before = before.trim();
            if !before.is_empty() {
                filled.push(before);
                highlights.extend(
                    line.highlights
                        .iter()
                        .filter(|highlight| before.contains(highlight.as_str()))
                        .cloned(),
                );
            }
            explanation.push(format!("{} {}", EXPLANATION_MARKER, after.trim()));
            in_explanation = true;
            continue;
        }

        if !filled.is_empty() && is_fully_formed(&filled.join(" ")) {
            match line.category {
                Category::Question => continue,
                _ => {
                    explanation.push(text.to_string());
                    in_explanation = true;
                    continue;
                }
            }
        }

        if text.is_empty() {
            continue;
        }
        filled.push(text);
        highlights.extend(line.highlights.iter().cloned());
    }

    (
        normalize_whitespace(&filled.join(" ")),
        explanation.join("\n").trim().to_string(),
        highlights,
    )
}
