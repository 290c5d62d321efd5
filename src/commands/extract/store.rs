use super::*;

pub(super) fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chapters (
          chapter_key TEXT PRIMARY KEY,
          chapter INTEGER,
          title TEXT NOT NULL,
          filename TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          item_count INTEGER NOT NULL,
          unresolved_count INTEGER NOT NULL,
          extracted_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
          chapter_key TEXT NOT NULL,
          position INTEGER NOT NULL,
          item_id TEXT NOT NULL,
          base INTEGER NOT NULL,
          sub INTEGER,
          native TEXT NOT NULL,
          question TEXT NOT NULL,
          filled_sentence TEXT NOT NULL,
          rendered_sentence TEXT NOT NULL,
          answer TEXT NOT NULL,
          answer_resolved INTEGER NOT NULL,
          answer_strategy TEXT,
          explanation TEXT NOT NULL,
          PRIMARY KEY (chapter_key, position)
        );

        CREATE INDEX IF NOT EXISTS idx_items_item_id ON items(item_id);
        ",
        )
        .context("failed to create store schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

/// Replaces each chapter's rows wholesale so reruns never accumulate stale
/// items.
pub(super) fn replace_chapters(
    connection: &mut Connection,
    chapters: &[ChapterExtraction],
    extracted_at: &str,
) -> Result<usize> {
    let tx = connection.transaction()?;
    let mut items_written = 0usize;

    {
        let mut delete_items = tx.prepare("DELETE FROM items WHERE chapter_key = ?1")?;
        let mut upsert_chapter = tx.prepare(
            "
            INSERT INTO chapters(
              chapter_key, chapter, title, filename, sha256,
              item_count, unresolved_count, extracted_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(chapter_key) DO UPDATE SET
              chapter=excluded.chapter,
              title=excluded.title,
              filename=excluded.filename,
              sha256=excluded.sha256,
              item_count=excluded.item_count,
              unresolved_count=excluded.unresolved_count,
              extracted_at=excluded.extracted_at
            ",
        )?;
        let mut insert_item = tx.prepare(
            "
            INSERT INTO items(
              chapter_key, position, item_id, base, sub, native, question,
              filled_sentence, rendered_sentence, answer, answer_resolved,
              answer_strategy, explanation
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
        )?;

        for chapter in chapters {
            let key = chapter.chapter_key();
            delete_items.execute(params![key])?;
            upsert_chapter.execute(params![
                key,
                chapter.source.chapter,
                chapter.title(),
                &chapter.source.filename,
                &chapter.source.sha256,
                chapter.items.len() as i64,
                chapter.unresolved_count() as i64,
                extracted_at
            ])?;

            for (position, item) in chapter.items.iter().enumerate() {
                insert_item.execute(params![
                    key,
                    position as i64,
                    item.identifier.to_string(),
                    item.identifier.base,
                    item.identifier.sub,
                    &item.native,
                    &item.question,
                    &item.filled_sentence,
                    item.rendered_sentence(),
                    item.answer.display_text(),
                    item.answer.is_resolved(),
                    item.answer.strategy().map(|strategy| strategy.as_str()),
                    &item.explanation
                ])?;
                items_written += 1;
            }
        }
    }

    tx.commit()?;
    Ok(items_written)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
