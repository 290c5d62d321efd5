use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::{ExtractionStats, ItemRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Text,
    Pdf,
    LineDump,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "json" => Some(Self::LineDump),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::LineDump => "line_dump",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub chapter: Option<u32>,
    pub format: SourceFormat,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub out_dir: String,
    pub index_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractCounts {
    pub source_count: usize,
    pub selected_count: usize,
    pub processed_count: usize,
    pub failed_count: usize,
    pub chapters_written: usize,
    #[serde(flatten)]
    pub extraction: ExtractionStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub jobs: usize,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub source_hashes: Vec<SourceEntry>,
    pub failures: Vec<DocumentFailure>,
    pub warnings: Vec<String>,
}

/// Subset of the run manifest read back by `status`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSummary {
    pub run_id: Option<String>,
    pub status: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub paths: Option<RunSummaryPaths>,
    pub counts: Option<RunSummaryCounts>,
    #[serde(default)]
    pub failures: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSummaryPaths {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSummaryCounts {
    pub processed_count: Option<usize>,
    pub failed_count: Option<usize>,
    pub items_kept: Option<usize>,
    pub blocks_dropped: Option<usize>,
    pub unresolved_answers: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterIndexEntry {
    pub chapter: Option<u32>,
    pub title: String,
    pub source: String,
    pub output_file: String,
    pub item_count: usize,
    pub unresolved_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterIndex {
    pub manifest_version: u32,
    pub generated_at: String,
    pub chapter_count: usize,
    pub chapters: Vec<ChapterIndexEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterFile {
    pub chapter: Option<u32>,
    pub title: String,
    pub source: String,
    pub items: Vec<ItemRecord>,
}
