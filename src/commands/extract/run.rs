use super::*;

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root));
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("chapters"));
    let index_path = out_dir.join("index.json");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join(DEFAULT_DB_FILE));
    let run_manifest_path = manifest_dir.join(format!(
        "extract_run_{}.json",
        utc_compact_string(started_ts)
    ));

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting extract");

    let inventory = load_or_refresh_inventory(
        &args.source_dir,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;

    let selected = select_sources(&inventory.sources, &args.chapters);
    if selected.is_empty() {
        bail!(
            "no sources match the requested chapters {:?} in {}",
            args.chapters,
            inventory_manifest_path.display()
        );
    }

    let jobs = resolve_jobs(args.jobs);
    info!(
        source_count = inventory.source_count,
        selected_count = selected.len(),
        jobs,
        "extracting chapters"
    );

    let extractor = Extractor::new()?;
    let source_dir = PathBuf::from(&inventory.source_directory);
    let outcomes = extract_all(&source_dir, &selected, &extractor, jobs)?;
    let summary = aggregate(outcomes);

    for warning in &summary.warnings {
        warn!(warning = %warning, "extract warning");
    }

    let updated_at = now_utc_string();
    let entries = write_chapter_files(&out_dir, &summary.chapters)?;
    let index = build_index(entries, &updated_at);
    write_json_pretty(&index_path, &index)?;
    info!(path = %index_path.display(), chapters = index.chapter_count, "wrote chapter index");

    let mut connection = open_store(&db_path)?;
    let items_written = replace_chapters(&mut connection, &summary.chapters, &updated_at)?;
    let chapters_total = count_rows(&connection, "SELECT COUNT(*) FROM chapters")?;
    let items_total = count_rows(&connection, "SELECT COUNT(*) FROM items")?;
    info!(
        path = %db_path.display(),
        items_written,
        chapters_total,
        items_total,
        "updated drill store"
    );

    let status = if summary.failures.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.to_string(),
        started_at,
        updated_at,
        command: render_extract_command(&args),
        jobs,
        paths: ExtractPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            out_dir: out_dir.display().to_string(),
            index_path: index_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: ExtractCounts {
            source_count: inventory.source_count,
            selected_count: selected.len(),
            processed_count: summary.chapters.len(),
            failed_count: summary.failures.len(),
            chapters_written: index.chapter_count,
            extraction: summary.stats.clone(),
        },
        source_hashes: selected,
        failures: summary.failures,
        warnings: summary.warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    write_json_pretty(&manifest_dir.join(LATEST_RUN_MANIFEST), &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote extract run manifest");
    info!(
        run_id = %run_id,
        status,
        chapters = manifest.counts.processed_count,
        failed = manifest.counts.failed_count,
        items = manifest.counts.extraction.items_kept,
        unresolved = manifest.counts.extraction.unresolved_answers,
        "extract completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    source_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<SourceInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(source_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            source_count = manifest.source_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: SourceInventoryManifest = read_json(inventory_manifest_path)?;
    info!(
        path = %inventory_manifest_path.display(),
        source_count = manifest.source_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

/// An empty filter selects every source.
pub(super) fn select_sources(sources: &[SourceEntry], chapters: &[u32]) -> Vec<SourceEntry> {
    sources
        .iter()
        .filter(|source| {
            chapters.is_empty()
                || source
                    .chapter
                    .is_some_and(|chapter| chapters.contains(&chapter))
        })
        .cloned()
        .collect()
}

pub(super) fn resolve_jobs(requested: Option<usize>) -> usize {
    match requested {
        Some(jobs) if jobs > 0 => jobs,
        _ => std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
    }
}

pub(super) fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec![
        "drillbook".to_string(),
        "extract".to_string(),
        "--source-dir".to_string(),
        args.source_dir.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.out_dir {
        command.push("--out-dir".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    for chapter in &args.chapters {
        command.push("--chapter".to_string());
        command.push(chapter.to_string());
    }
    if let Some(jobs) = args.jobs {
        command.push("--jobs".to_string());
        command.push(jobs.to_string());
    }

    command.join(" ")
}
