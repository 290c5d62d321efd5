use std::collections::HashSet;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::{Connection, params};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::commands::inventory;
use crate::model::{
    ChapterFile, ChapterIndex, ChapterIndexEntry, DocumentFailure, ExtractCounts, ExtractPaths,
    ExtractRunManifest, SourceEntry, SourceFormat, SourceInventoryManifest,
};
use crate::pipeline::{DocumentExtraction, ExtractionStats, Extractor, Item, SourceLine};
use crate::util::{
    ensure_directory, now_utc_string, read_json, utc_compact_string, write_json_pretty,
};

const DB_SCHEMA_VERSION: &str = "0.1.0";
pub const LATEST_RUN_MANIFEST: &str = "extract_run_latest.json";
pub const DEFAULT_DB_FILE: &str = "drillbook.sqlite";

mod batch;
mod output;
mod run;
mod source;
mod store;

pub use run::run;
pub use source::read_source_lines;
pub use store::count_rows;

use batch::*;
use output::*;
use run::*;
use source::*;
use store::*;
