use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ClassifyArgs;
use crate::commands::extract::read_source_lines;
use crate::model::SourceFormat;
use crate::pipeline::{Category, Line, LineClassifier, RawIdentifier, SourceLine};

#[derive(Debug, Serialize)]
struct ClassifiedLine {
    index: usize,
    category: &'static str,
    identifier: Option<String>,
    text: String,
    highlights: Vec<String>,
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let format = SourceFormat::from_path(&args.path).with_context(|| {
        format!(
            "unsupported source format (expected .txt, .pdf or .json): {}",
            args.path.display()
        )
    })?;

    let lines = read_source_lines(&args.path, format)?;
    let classifier = LineClassifier::new()?;
    let rows = classify_lines(&classifier, &lines);

    let noise = rows
        .iter()
        .filter(|row| row.category == Category::Noise.as_str())
        .count();
    info!(
        path = %args.path.display(),
        format = format.as_str(),
        lines = rows.len(),
        noise,
        "classified source"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        serde_json::to_writer_pretty(&mut output, &rows)
            .context("failed to serialize classify json output")?;
        writeln!(output)?;
    } else {
        for row in &rows {
            writeln!(
                output,
                "{:04} [{}] {}{}",
                row.index,
                row.category,
                row.identifier
                    .as_deref()
                    .map(|id| format!("<{id}> "))
                    .unwrap_or_default(),
                row.text
            )?;
        }
    }
    output.flush()?;

    Ok(())
}

fn classify_lines(classifier: &LineClassifier, lines: &[SourceLine]) -> Vec<ClassifiedLine> {
    lines
        .iter()
        .enumerate()
        .map(|(index, source)| to_row(index, classifier.classify(source)))
        .collect()
}

fn to_row(index: usize, line: Line) -> ClassifiedLine {
    ClassifiedLine {
        index,
        category: line.category.as_str(),
        identifier: line.identifier.map(render_identifier),
        text: line.text,
        highlights: line.highlights,
    }
}

fn render_identifier(identifier: RawIdentifier) -> String {
    match identifier {
        RawIdentifier::Full(identifier) => identifier.to_string(),
        RawIdentifier::Continuation(sub) => format!("-{sub}"),
    }
}
