use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::cli::InventoryArgs;
use crate::model::{SourceEntry, SourceFormat, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        for source in &manifest.sources {
            info!(
                filename = %source.filename,
                chapter = ?source.chapter,
                format = source.format.as_str(),
                "source"
            );
        }
        info!(
            source_count = manifest.source_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("source_inventory.json")
}

pub fn build_manifest(source_dir: &Path) -> Result<SourceInventoryManifest> {
    let digits = Regex::new(r"[0-9]+").context("failed to compile chapter number regex")?;

    let mut paths = discover_sources(source_dir)?;
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    if paths.is_empty() {
        bail!("no chapter sources found in {}", source_dir.display());
    }

    let mut sources = Vec::with_capacity(paths.len());
    for (path, format) in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let chapter = chapter_number(&filename, &digits);
        if chapter.is_none() {
            warn!(filename = %filename, "no chapter number in filename; sorting last");
        }
        let sha256 = sha256_file(&path)?;

        sources.push(SourceEntry {
            filename,
            chapter,
            format,
            sha256,
        });
    }

    sources.sort_by(|a, b| {
        chapter_sort_key(a.chapter)
            .cmp(&chapter_sort_key(b.chapter))
            .then(a.filename.cmp(&b.filename))
    });

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        source_count: sources.len(),
        sources,
    })
}

/// First run of digits after NFKC folding, so full-width `１２章` reads as 12.
pub fn chapter_number(filename: &str, digits: &Regex) -> Option<u32> {
    let normalized = filename.nfkc().collect::<String>();
    digits
        .find(&normalized)
        .and_then(|found| found.as_str().parse::<u32>().ok())
}

/// Unnumbered chapters sort after every numbered one.
pub fn chapter_sort_key(chapter: Option<u32>) -> (bool, u32) {
    (chapter.is_none(), chapter.unwrap_or_default())
}

fn discover_sources(source_dir: &Path) -> Result<Vec<(PathBuf, SourceFormat)>> {
    let mut sources = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if let Some(format) = SourceFormat::from_path(&path) {
            sources.push((path, format));
        }
    }

    Ok(sources)
}
