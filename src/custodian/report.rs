use crate::custodian::index::IndexEntry;
use crate::custodian::locate::ContentGroup;
use crate::custodian::reconcile::ReconciliationResult;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_VERSION: &str = "1.2";

pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn report_stamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

#[derive(Debug, Serialize)]
pub struct CleanupStatistics {
    pub scanned: usize,
    pub valid: usize,
    pub orphaned: usize,
}

/// Immutable record of one reconciliation run. A new run writes a new
/// report; prior reports are never edited.
#[derive(Debug, Serialize)]
pub struct CleanupReport<'a> {
    pub timestamp: String,
    pub dry_run: bool,
    pub statistics: CleanupStatistics,
    pub orphaned_groups: &'a [ContentGroup],
}

pub fn write_cleanup_report(
    repo_root: &Path,
    result: &ReconciliationResult,
    dry_run: bool,
) -> Result<PathBuf> {
    let report = CleanupReport {
        timestamp: utc_timestamp(),
        dry_run,
        statistics: CleanupStatistics {
            scanned: result.scanned(),
            valid: result.valid.len(),
            orphaned: result.orphaned.len(),
        },
        orphaned_groups: &result.orphaned,
    };

    let path = repo_root.join(format!("cleanup_report_{}.json", report_stamp()));
    let data = serde_json::to_string_pretty(&report)?;
    fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// The canonical manifest document. `mode` tells consumers whether the
/// entries are authoritative or a degraded local view.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub version: &'static str,
    pub generated_at: String,
    pub mode: &'static str,
    pub count: usize,
    pub entries: Vec<IndexEntry>,
}

/// Replace the manifest wholesale: write to a temp file in the same
/// directory, then persist over the target so readers never observe a
/// half-written document.
pub fn write_manifest_atomic(path: &Path, manifest: &Manifest) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let data = serde_json::to_string(manifest)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
        .context("failed to create manifest temp file")?;
    tmp.write_all(data.as_bytes())
        .context("failed to write manifest temp file")?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DiscrepancyReport<'a> {
    pub generated_at: &'a str,
    pub count: usize,
    pub unknown_on_disk: &'a [String],
}

pub fn write_discrepancy_report(
    repo_root: &Path,
    generated_at: &str,
    unknown_on_disk: &[String],
) -> Result<PathBuf> {
    let report = DiscrepancyReport {
        generated_at,
        count: unknown_on_disk.len(),
        unknown_on_disk,
    };
    let path = repo_root.join("index_discrepancies.json");
    let data = serde_json::to_string_pretty(&report)?;
    fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{Manifest, utc_timestamp, write_manifest_atomic};
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn utc_timestamp_is_iso8601_zulu() {
        let stamp = utc_timestamp();
        assert!(stamp.ends_with('Z'));
        assert!(stamp.contains('T'));
    }

    #[test]
    fn manifest_write_replaces_the_previous_document() {
        let tmp = tempdir().expect("tempdir");
        let target = tmp.path().join("index.json");
        fs::write(&target, "stale contents").expect("seed stale manifest");

        let manifest = Manifest {
            version: super::MANIFEST_VERSION,
            generated_at: "2026-08-07T00:00:00Z".to_string(),
            mode: "filesystem_fallback",
            count: 0,
            entries: Vec::new(),
        };
        write_manifest_atomic(&target, &manifest).expect("write manifest");

        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(&target).expect("read")).expect("json");
        assert_eq!(parsed["version"], "1.2");
        assert_eq!(parsed["mode"], "filesystem_fallback");
        assert_eq!(parsed["count"], 0);
        assert!(parsed["entries"].as_array().expect("entries").is_empty());
    }
}
