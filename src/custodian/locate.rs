use crate::custodian::definition::{self, DEFINITION_EXTENSION};
use crate::custodian::paths::CustodianPaths;
use crate::custodian::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Derived asset files co-located with a definition, resolved by filename
/// convention against the asset root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetPaths {
    pub primary: Option<PathBuf>,
    pub minimap_png: Option<PathBuf>,
    pub minimap_jpg: Option<PathBuf>,
}

impl AssetPaths {
    pub fn present(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.primary, &self.minimap_png, &self.minimap_jpg]
            .into_iter()
            .flatten()
    }
}

/// A definition file plus its derived assets, treated as one unit for
/// reconciliation. `id` comes from the definition's embedded identifier,
/// never from the filename.
#[derive(Debug, Clone, Serialize)]
pub struct ContentGroup {
    pub id: Option<String>,
    pub definition_path: PathBuf,
    pub assets: AssetPaths,
    pub total_bytes: u64,
}

impl ContentGroup {
    /// Definition plus every resolved asset.
    pub fn file_count(&self) -> usize {
        1 + self.assets.present().count()
    }
}

fn is_quarantine_dir(dir: &Path, quarantine_root: &Path) -> bool {
    if dir.starts_with(quarantine_root) {
        return true;
    }
    match (dir.file_name(), quarantine_root.file_name()) {
        (Some(name), Some(quarantine_name)) => name == quarantine_name,
        _ => false,
    }
}

fn collect_definitions(
    dir: &Path,
    quarantine_root: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if is_quarantine_dir(&path, quarantine_root) {
                continue;
            }
            collect_definitions(&path, quarantine_root, out)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some(DEFINITION_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

/// Walk the content root for definition files, excluding the quarantine
/// subtree. Results are sorted lexicographically so later first-seen-wins
/// deduplication is reproducible across platforms.
pub fn collect_definition_files(
    content_root: &Path,
    quarantine_root: &Path,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if content_root.is_dir() {
        collect_definitions(content_root, quarantine_root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn existing_size(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

fn resolve_assets(asset_root: &Path, base_name: &str) -> AssetPaths {
    let candidate = |file_name: String| {
        let path = asset_root.join(file_name);
        path.is_file().then_some(path)
    };

    AssetPaths {
        primary: candidate(format!("{base_name}.png")),
        minimap_png: candidate(format!("{base_name}_minimap.png")),
        minimap_jpg: candidate(format!("{base_name}_minimap.jpg")),
    }
}

fn group_for_definition(definition_path: &Path, asset_root: &Path, id: String) -> ContentGroup {
    let base_name = definition_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let assets = resolve_assets(asset_root, base_name);

    let mut total_bytes = existing_size(definition_path);
    for asset in assets.present() {
        total_bytes += existing_size(asset);
    }

    ContentGroup {
        id: Some(id),
        definition_path: definition_path.to_path_buf(),
        assets,
        total_bytes,
    }
}

/// Discover every content group under the content root. Unparsable
/// definitions and definitions without an embedded identifier are reported
/// as warnings and skipped; they are never candidates for cleanup.
pub fn locate(paths: &CustodianPaths) -> Result<Vec<ContentGroup>> {
    let definitions = collect_definition_files(&paths.content_root, &paths.quarantine_root)?;

    let mut groups = Vec::new();
    for definition_path in &definitions {
        let meta = match definition::parse_definition(definition_path) {
            Ok(meta) => meta,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "PARSE_FAILED",
                    stage: "locate",
                    path: &definition_path.display().to_string(),
                    reason: "definition-unreadable",
                    err: &err.to_string(),
                });
                continue;
            }
        };

        let Some(id) = meta.id else {
            warn::emit(WarnEvent {
                code: "MISSING_ID",
                stage: "locate",
                path: &definition_path.display().to_string(),
                reason: "definition-has-no-identifier",
                err: "skipped; groups without an id are never cleaned up",
            });
            continue;
        };

        groups.push(group_for_definition(definition_path, &paths.asset_root, id));
    }

    Ok(groups)
}
