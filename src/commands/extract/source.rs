use super::*;

/// Line dump entries are either a bare string or a line with formatting runs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpedLine {
    Plain(String),
    Formatted(SourceLine),
}

pub fn read_source_lines(path: &Path, format: SourceFormat) -> Result<Vec<SourceLine>> {
    match format {
        SourceFormat::Text => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(text_lines(&raw))
        }
        SourceFormat::Pdf => {
            let raw = extract_text_with_pdftotext(path)?;
            Ok(text_lines(&raw))
        }
        SourceFormat::LineDump => {
            let raw =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            parse_line_dump(&raw)
                .with_context(|| format!("failed to parse line dump {}", path.display()))
        }
    }
}

pub(super) fn text_lines(raw: &str) -> Vec<SourceLine> {
    raw.lines()
        .map(|line| line.replace('\u{0000}', ""))
        .map(SourceLine::plain)
        .collect()
}

pub(super) fn parse_line_dump(raw: &[u8]) -> Result<Vec<SourceLine>> {
    let entries: Vec<DumpedLine> = serde_json::from_slice(raw)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            DumpedLine::Plain(text) => SourceLine::plain(text),
            DumpedLine::Formatted(line) => line,
        })
        .collect())
}

/// Whole-document text layer; page breaks become line breaks.
fn extract_text_with_pdftotext(pdf_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    Ok(raw.replace('\u{000C}', "\n"))
}
