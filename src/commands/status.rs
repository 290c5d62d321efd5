use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::{DEFAULT_DB_FILE, LATEST_RUN_MANIFEST, count_rows};
use crate::commands::inventory;
use crate::model::{RunSummary, SourceInventoryManifest};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = inventory::default_manifest_path(&args.cache_root);
    let run_path = manifest_dir.join(LATEST_RUN_MANIFEST);

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: SourceInventoryManifest = read_json(&inventory_path)?;
        let unnumbered = inventory
            .sources
            .iter()
            .filter(|source| source.chapter.is_none())
            .count();
        info!(
            generated_at = %inventory.generated_at,
            source_directory = %inventory.source_directory,
            source_count = inventory.source_count,
            unnumbered,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    let summary = if run_path.exists() {
        let summary: RunSummary = read_json(&run_path)?;
        let counts = summary.counts.as_ref();
        info!(
            run_id = %summary.run_id.clone().unwrap_or_default(),
            status = %summary.status.clone().unwrap_or_default(),
            started_at = %summary.started_at.clone().unwrap_or_default(),
            updated_at = %summary.updated_at.clone().unwrap_or_default(),
            processed = counts.and_then(|value| value.processed_count).unwrap_or_default(),
            failed = counts.and_then(|value| value.failed_count).unwrap_or_default(),
            items = counts.and_then(|value| value.items_kept).unwrap_or_default(),
            dropped = counts.and_then(|value| value.blocks_dropped).unwrap_or_default(),
            unresolved = counts.and_then(|value| value.unresolved_answers).unwrap_or_default(),
            "loaded latest extract run"
        );
        for failure in &summary.failures {
            warn!(failure = %failure, "chapter failed in latest run");
        }
        Some(summary)
    } else {
        warn!(path = %run_path.display(), "extract run manifest missing");
        None
    };

    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref(), summary.as_ref());
    if db_path.exists() {
        let connection = open_read_only(&db_path)?;
        let chapters = count_rows(&connection, "SELECT COUNT(*) FROM chapters").unwrap_or(0);
        let items = count_rows(&connection, "SELECT COUNT(*) FROM items").unwrap_or(0);
        let unresolved = count_rows(
            &connection,
            "SELECT COUNT(*) FROM items WHERE answer_resolved = 0",
        )
        .unwrap_or(0);

        info!(
            path = %db_path.display(),
            chapters,
            items,
            unresolved,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Explicit flag first, then the store recorded by the latest run, then the
/// default location under the cache root.
fn resolve_db_path(
    cache_root: &Path,
    explicit: Option<&Path>,
    summary: Option<&RunSummary>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    summary
        .and_then(|summary| summary.paths.as_ref())
        .and_then(|paths| paths.db_path.as_deref())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| cache_root.join(DEFAULT_DB_FILE))
}

fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))
}
