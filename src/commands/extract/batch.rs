use super::*;

#[derive(Debug)]
pub(super) struct ChapterExtraction {
    pub(super) source: SourceEntry,
    pub(super) output_file: String,
    pub(super) items: Vec<Item>,
    pub(super) stats: ExtractionStats,
}

impl ChapterExtraction {
    pub(super) fn title(&self) -> String {
        match self.source.chapter {
            Some(chapter) => format!("Chapter {chapter}"),
            None => file_stem(&self.source.filename).to_string(),
        }
    }

    pub(super) fn chapter_key(&self) -> &str {
        self.output_file
            .strip_suffix(".json")
            .unwrap_or(&self.output_file)
    }

    pub(super) fn unresolved_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !item.answer.is_resolved())
            .count()
    }
}

#[derive(Debug, Default)]
pub(super) struct BatchSummary {
    pub(super) chapters: Vec<ChapterExtraction>,
    pub(super) failures: Vec<DocumentFailure>,
    pub(super) stats: ExtractionStats,
    pub(super) warnings: Vec<String>,
}

/// Runs one independent extraction per source on a fixed-size pool. Results
/// come back in input order, each carrying its own success or failure.
pub(super) fn extract_all(
    source_dir: &Path,
    sources: &[SourceEntry],
    extractor: &Extractor,
    jobs: usize,
) -> Result<Vec<(SourceEntry, Result<DocumentExtraction>)>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .thread_name(|index| format!("drillbook-worker-{index}"))
        .build()
        .context("failed to build extraction worker pool")?;

    let outcomes: Vec<(SourceEntry, Result<DocumentExtraction>)> = pool.install(|| {
        sources
            .par_iter()
            .map(|source| {
                let path = source_dir.join(&source.filename);
                let result = read_source_lines(&path, source.format)
                    .map(|lines| extractor.extract(&lines));
                (source.clone(), result)
            })
            .collect()
    });

    Ok(outcomes)
}

/// Barrier step: folds worker results into chapter order. Ordering depends on
/// chapter numbers only, never on completion order.
pub(super) fn aggregate(outcomes: Vec<(SourceEntry, Result<DocumentExtraction>)>) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (source, result) in outcomes {
        match result {
            Ok(extraction) => {
                info!(
                    filename = %source.filename,
                    chapter = ?source.chapter,
                    lines = extraction.stats.lines_seen,
                    blocks = extraction.stats.blocks_sealed,
                    items = extraction.stats.items_kept,
                    dropped = extraction.stats.blocks_dropped,
                    unresolved = extraction.stats.unresolved_answers,
                    "extracted chapter"
                );
                summary.stats.absorb(&extraction.stats);
                summary.chapters.push(ChapterExtraction {
                    source,
                    output_file: String::new(),
                    items: extraction.items,
                    stats: extraction.stats,
                });
            }
            Err(error) => {
                warn!(
                    filename = %source.filename,
                    error = %format!("{error:#}"),
                    "chapter extraction failed; continuing"
                );
                summary.failures.push(DocumentFailure {
                    filename: source.filename,
                    error: format!("{error:#}"),
                });
            }
        }
    }

    summary.chapters.sort_by(|a, b| {
        inventory::chapter_sort_key(a.source.chapter)
            .cmp(&inventory::chapter_sort_key(b.source.chapter))
            .then(a.source.filename.cmp(&b.source.filename))
    });
    summary
        .failures
        .sort_by(|a, b| a.filename.cmp(&b.filename));

    let mut used_names = HashSet::new();
    for chapter in &mut summary.chapters {
        let mut name = chapter_output_name(chapter.source.chapter, &chapter.source.filename);
        if !used_names.insert(name.clone()) {
            summary.warnings.push(format!(
                "chapter number {:?} appears more than once; {} written separately",
                chapter.source.chapter, chapter.source.filename
            ));
            name = format!(
                "{}-{}.json",
                name.trim_end_matches(".json"),
                sanitize_stem(&chapter.source.filename)
            );
            used_names.insert(name.clone());
        }
        chapter.output_file = name;
    }

    summary
}

pub(super) fn chapter_output_name(chapter: Option<u32>, filename: &str) -> String {
    match chapter {
        Some(chapter) => format!("chapter-{chapter:02}.json"),
        None => format!("chapter-x-{}.json", sanitize_stem(filename)),
    }
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

fn sanitize_stem(filename: &str) -> String {
    file_stem(filename)
        .chars()
        .map(|character| {
            if character.is_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}
