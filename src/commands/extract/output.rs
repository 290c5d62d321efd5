use super::*;

pub(super) fn write_chapter_files(
    out_dir: &Path,
    chapters: &[ChapterExtraction],
) -> Result<Vec<ChapterIndexEntry>> {
    ensure_directory(out_dir)?;

    let mut entries = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let file = ChapterFile {
            chapter: chapter.source.chapter,
            title: chapter.title(),
            source: chapter.source.filename.clone(),
            items: chapter.items.iter().map(Item::to_record).collect(),
        };
        let path = out_dir.join(&chapter.output_file);
        write_json_pretty(&path, &file)?;

        entries.push(ChapterIndexEntry {
            chapter: chapter.source.chapter,
            title: file.title,
            source: file.source,
            output_file: chapter.output_file.clone(),
            item_count: chapter.items.len(),
            unresolved_count: chapter.unresolved_count(),
        });
    }

    Ok(entries)
}

pub(super) fn build_index(entries: Vec<ChapterIndexEntry>, generated_at: &str) -> ChapterIndex {
    ChapterIndex {
        manifest_version: 1,
        generated_at: generated_at.to_string(),
        chapter_count: entries.len(),
        chapters: entries,
    }
}
