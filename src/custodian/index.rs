use crate::custodian::definition;
use crate::custodian::locate;
use crate::custodian::paths::CustodianPaths;
use crate::custodian::warn::{self, WarnEvent};
use crate::store::{MetadataStore, StoreRecord};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Terminal mode of one index build. Consumers treat the two filesystem
/// modes as degraded: popularity statistics are zeroed and entries reflect
/// only what the local tree can prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Database,
    DatabaseWithFileValidation,
    FilesystemDefault,
    FilesystemFallback,
}

impl IndexMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::DatabaseWithFileValidation => "database_with_file_validation",
            Self::FilesystemDefault => "filesystem_default",
            Self::FilesystemFallback => "filesystem_fallback",
        }
    }

    pub fn is_degraded(self) -> bool {
        matches!(self, Self::FilesystemDefault | Self::FilesystemFallback)
    }
}

/// Outcome of the single bounded attempt to list active records. The whole
/// cascade keys off this value; no second store call is ever made.
#[derive(Debug)]
pub enum StoreProbe {
    Active(Vec<StoreRecord>),
    Empty,
    Unavailable(String),
}

pub fn probe_store(store: &dyn MetadataStore) -> StoreProbe {
    match store.list_active_records() {
        Ok(records) if records.is_empty() => StoreProbe::Empty,
        Ok(records) => StoreProbe::Active(records),
        Err(err) => StoreProbe::Unavailable(err.to_string()),
    }
}

fn rule_unavailable(probe: &StoreProbe, _validate_files: bool) -> bool {
    matches!(probe, StoreProbe::Unavailable(_))
}

fn rule_empty(probe: &StoreProbe, _validate_files: bool) -> bool {
    matches!(probe, StoreProbe::Empty)
}

fn rule_validated(probe: &StoreProbe, validate_files: bool) -> bool {
    validate_files && matches!(probe, StoreProbe::Active(_))
}

fn rule_database(probe: &StoreProbe, _validate_files: bool) -> bool {
    matches!(probe, StoreProbe::Active(_))
}

type ModeRule = (fn(&StoreProbe, bool) -> bool, IndexMode);

/// The source-priority cascade as an ordered decision table; the first
/// matching row wins.
const MODE_RULES: &[ModeRule] = &[
    (rule_unavailable, IndexMode::FilesystemFallback),
    (rule_empty, IndexMode::FilesystemDefault),
    (rule_validated, IndexMode::DatabaseWithFileValidation),
    (rule_database, IndexMode::Database),
];

pub fn select_mode(probe: &StoreProbe, validate_files: bool) -> IndexMode {
    for (applies, mode) in MODE_RULES {
        if applies(probe, validate_files) {
            return *mode;
        }
    }
    IndexMode::FilesystemFallback
}

/// One manifest row. Store-only popularity fields are zero when the entry
/// was derived from the filesystem.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_steam_id: Option<String>,
    pub category: String,
    pub version: String,
    pub tags: String,
    pub width: u32,
    pub height: u32,
    pub mod_dependencies: Vec<String>,
    pub path: String,
    pub likes: u64,
    pub dislikes: u64,
    pub saved_count: u64,
    pub created_at: String,
}

#[derive(Debug, Default)]
pub struct GenerationStats {
    pub store_records: usize,
    pub disk_groups: usize,
    pub entries: usize,
    pub missing_on_disk: usize,
    pub discrepancies: usize,
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub mode: IndexMode,
    pub entries: Vec<IndexEntry>,
    pub discrepancies: Vec<String>,
    pub stats: GenerationStats,
}

fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/")
}

fn repo_relative(path: &Path, repo_root: &Path) -> String {
    let relative = path.strip_prefix(repo_root).unwrap_or(path);
    normalize_path(&relative.display().to_string())
}

fn entry_from_record(record: &StoreRecord, mod_dependencies: Vec<String>) -> IndexEntry {
    IndexEntry {
        id: record.id.clone(),
        name: record.name.clone(),
        author: record.author.clone(),
        author_steam_id: record.author_steam_id.clone(),
        category: record.category.clone(),
        version: record.version.clone(),
        tags: record.tags.clone(),
        width: record.width,
        height: record.height,
        mod_dependencies,
        path: normalize_path(&record.path),
        likes: record.likes,
        dislikes: record.dislikes,
        saved_count: record.saved_count,
        created_at: record.created_at.clone(),
    }
}

fn build_from_records(
    records: Vec<StoreRecord>,
    validate_files: bool,
    paths: &CustodianPaths,
    mode: IndexMode,
) -> Result<IndexOutcome> {
    let mut stats = GenerationStats {
        store_records: records.len(),
        ..GenerationStats::default()
    };
    let mut entries = Vec::new();

    for record in &records {
        let file = paths.repo_root.join(&record.path);
        if !file.is_file() {
            stats.missing_on_disk += 1;
            warn::emit(WarnEvent {
                code: "RECORD_FILE_MISSING",
                stage: "index",
                path: &record.path,
                reason: "store-record-has-no-file-on-disk",
                err: "record skipped from manifest",
            });
            continue;
        }

        // The store does not carry mod dependencies; only the definition
        // file knows them.
        let mod_dependencies = definition::parse_definition(&file)
            .map(|meta| meta.mod_dependencies)
            .unwrap_or_default();
        entries.push(entry_from_record(record, mod_dependencies));
    }

    let mut discrepancies = Vec::new();
    if validate_files {
        let known_ids: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let groups = locate::locate(paths)?;
        stats.disk_groups = groups.len();
        for group in &groups {
            if let Some(id) = group.id.as_deref()
                && !known_ids.contains(id)
            {
                discrepancies.push(id.to_string());
            }
        }
    }

    stats.entries = entries.len();
    stats.discrepancies = discrepancies.len();
    Ok(IndexOutcome {
        mode,
        entries,
        discrepancies,
        stats,
    })
}

fn build_from_filesystem(
    paths: &CustodianPaths,
    generated_at: &str,
    mode: IndexMode,
) -> Result<IndexOutcome> {
    let definitions =
        locate::collect_definition_files(&paths.content_root, &paths.quarantine_root)?;

    let mut stats = GenerationStats::default();
    let mut entries = Vec::new();

    for definition_path in &definitions {
        let meta = match definition::parse_definition(definition_path) {
            Ok(meta) => meta,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "PARSE_FAILED",
                    stage: "index",
                    path: &definition_path.display().to_string(),
                    reason: "definition-unreadable",
                    err: &err.to_string(),
                });
                continue;
            }
        };
        stats.disk_groups += 1;

        // Without the store there is no authoritative id; fall back to the
        // file stem so the entry stays addressable.
        let id = meta.id.clone().unwrap_or_else(|| {
            definition_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("unknown")
                .to_string()
        });

        entries.push(IndexEntry {
            id,
            name: meta.name,
            author: meta.author,
            author_steam_id: None,
            category: meta.category,
            version: meta.version,
            tags: meta.tags,
            width: meta.width,
            height: meta.height,
            mod_dependencies: meta.mod_dependencies,
            path: repo_relative(definition_path, &paths.repo_root),
            likes: 0,
            dislikes: 0,
            saved_count: 0,
            created_at: generated_at.to_string(),
        });
    }

    stats.entries = entries.len();
    Ok(IndexOutcome {
        mode,
        entries,
        discrepancies: Vec::new(),
        stats,
    })
}

/// Resolve the cascade for a completed store probe and produce the manifest
/// rows for the winning mode.
pub fn build(
    probe: StoreProbe,
    validate_files: bool,
    paths: &CustodianPaths,
    generated_at: &str,
) -> Result<IndexOutcome> {
    let mode = select_mode(&probe, validate_files);
    match (mode, probe) {
        (IndexMode::Database, StoreProbe::Active(records)) => {
            build_from_records(records, false, paths, mode)
        }
        (IndexMode::DatabaseWithFileValidation, StoreProbe::Active(records)) => {
            build_from_records(records, true, paths, mode)
        }
        (mode, _) => build_from_filesystem(paths, generated_at, mode),
    }
}
