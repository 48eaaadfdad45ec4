use crate::custodian::locate::ContentGroup;
use crate::custodian::paths::CustodianPaths;
use crate::custodian::util::{self, CancelFlag};
use crate::custodian::warn::{self, WarnEvent};
use crate::error::CustodianError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupStrategy {
    /// Relocate the group into the quarantine tree.
    Move,
    /// Permanently remove the group and its derived assets.
    Delete,
    /// Copy into quarantine, verify the copy by hash, then remove the source.
    BackupCopy,
}

impl CleanupStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "move" => Some(Self::Move),
            "delete" => Some(Self::Delete),
            "backup-copy" | "backup" => Some(Self::BackupCopy),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Delete => "delete",
            Self::BackupCopy => "backup-copy",
        }
    }
}

/// Per-file record of one cleanup run. Simulation produces the same shape
/// with zero filesystem mutation, so "would do" and "did" reports diff
/// cleanly apart from the `simulate` flag.
#[derive(Debug, Default)]
pub struct CleanupOutcome {
    pub simulate: bool,
    pub attempted: Vec<PathBuf>,
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupOutcome {
    fn record_failure(&mut self, path: &Path, reason: String) {
        let err = CustodianError::FileOpFailure {
            path: path.display().to_string(),
            reason: reason.clone(),
        };
        warn::emit(WarnEvent {
            code: "FILE_OP_FAILED",
            stage: "cleanup",
            path: &path.display().to_string(),
            reason: "continuing-with-next-file",
            err: &err.to_string(),
        });
        self.failed.push((path.to_path_buf(), reason));
    }
}

/// Definition plus resolved assets, paired with their quarantine
/// destinations (filenames preserved, definition and assets kept in
/// separate quarantine subtrees).
fn relocation_targets(group: &ContentGroup, paths: &CustodianPaths) -> Vec<(PathBuf, PathBuf)> {
    let mut targets = Vec::new();
    if let Some(name) = group.definition_path.file_name() {
        targets.push((
            group.definition_path.clone(),
            paths.quarantine_content_dir.join(name),
        ));
    }
    for asset in group.assets.present() {
        if let Some(name) = asset.file_name() {
            targets.push((asset.clone(), paths.quarantine_asset_dir.join(name)));
        }
    }
    targets
}

/// Deletion does not trust the group's resolved assets: candidates are
/// re-derived from the definition's base name against the asset root, so a
/// group whose asset resolution was incomplete is still fully removed.
fn deletion_candidates(group: &ContentGroup, paths: &CustodianPaths) -> Vec<PathBuf> {
    let mut candidates = vec![group.definition_path.clone()];
    if let Some(base_name) = group
        .definition_path
        .file_stem()
        .and_then(|stem| stem.to_str())
    {
        candidates.push(paths.asset_root.join(format!("{base_name}.png")));
        candidates.push(paths.asset_root.join(format!("{base_name}_minimap.png")));
        candidates.push(paths.asset_root.join(format!("{base_name}_minimap.jpg")));
    }
    candidates
}

fn execute_move(group: &ContentGroup, paths: &CustodianPaths, out: &mut CleanupOutcome) {
    for (from, to) in relocation_targets(group, paths) {
        if !from.exists() {
            // Already moved by a prior run; idempotent no-op.
            continue;
        }
        out.attempted.push(from.clone());
        if out.simulate {
            out.succeeded.push(from);
            continue;
        }
        match util::move_file(&from, &to) {
            Ok(()) => out.succeeded.push(from),
            Err(err) => out.record_failure(&from, format!("{err:#}")),
        }
    }
}

fn execute_delete(group: &ContentGroup, paths: &CustodianPaths, out: &mut CleanupOutcome) {
    for candidate in deletion_candidates(group, paths) {
        if !candidate.exists() {
            continue;
        }
        out.attempted.push(candidate.clone());
        if out.simulate {
            out.succeeded.push(candidate);
            continue;
        }
        match fs::remove_file(&candidate) {
            Ok(()) => out.succeeded.push(candidate),
            Err(err) => out.record_failure(&candidate, err.to_string()),
        }
    }
}

fn copy_and_verify(from: &Path, to: &Path) -> Result<(), String> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|err| format!("failed to create quarantine dir: {err}"))?;
    }
    fs::copy(from, to).map_err(|err| format!("copy failed: {err}"))?;

    let source_hash = util::file_hash(from).map_err(|err| format!("{err:#}"))?;
    let copy_hash = util::file_hash(to).map_err(|err| format!("{err:#}"))?;
    if source_hash != copy_hash {
        let _ = fs::remove_file(to);
        return Err("copy verification failed (hash mismatch), source left in place".to_string());
    }

    fs::remove_file(from).map_err(|err| format!("verified copy but failed to remove source: {err}"))
}

fn execute_backup_copy(group: &ContentGroup, paths: &CustodianPaths, out: &mut CleanupOutcome) {
    for (from, to) in relocation_targets(group, paths) {
        if !from.exists() {
            continue;
        }
        out.attempted.push(from.clone());
        if out.simulate {
            out.succeeded.push(from);
            continue;
        }
        match copy_and_verify(&from, &to) {
            Ok(()) => out.succeeded.push(from),
            Err(reason) => out.record_failure(&from, reason),
        }
    }
}

/// Apply `strategy` to every orphaned group. Best-effort per file: a
/// failure is recorded and processing continues with the next file, never
/// aborting the group or the batch. The cancellation flag is honored
/// between groups.
pub fn execute(
    orphaned: &[ContentGroup],
    strategy: CleanupStrategy,
    simulate: bool,
    paths: &CustodianPaths,
    cancel: &CancelFlag,
) -> CleanupOutcome {
    let mut out = CleanupOutcome {
        simulate,
        ..CleanupOutcome::default()
    };

    for group in orphaned {
        if cancel.is_cancelled() {
            break;
        }
        match strategy {
            CleanupStrategy::Move => execute_move(group, paths, &mut out),
            CleanupStrategy::Delete => execute_delete(group, paths, &mut out),
            CleanupStrategy::BackupCopy => execute_backup_copy(group, paths, &mut out),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{CleanupStrategy, execute};
    use crate::custodian::config::CustodianConfig;
    use crate::custodian::locate::locate;
    use crate::custodian::paths::CustodianPaths;
    use crate::custodian::util::CancelFlag;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn paths_for(root: &Path) -> CustodianPaths {
        let cfg = CustodianConfig::default();
        CustodianPaths {
            repo_root: root.to_path_buf(),
            content_root: root.join(&cfg.layout.content_root),
            asset_root: root.join(&cfg.layout.asset_root),
            quarantine_root: root.join(&cfg.layout.quarantine_root),
            quarantine_content_dir: root
                .join(&cfg.layout.quarantine_root)
                .join(&cfg.layout.content_root),
            quarantine_asset_dir: root
                .join(&cfg.layout.quarantine_root)
                .join(&cfg.layout.asset_root),
            index_file: root.join(&cfg.layout.index_file),
        }
    }

    fn seed_group(paths: &CustodianPaths, id: &str, stem: &str) {
        let definition = paths.content_root.join(format!("{stem}.xml"));
        fs::create_dir_all(definition.parent().expect("parent")).expect("mkdir");
        fs::write(
            &definition,
            format!(
                "<building><extraInfo><BuildingID>{id}</BuildingID></extraInfo></building>"
            ),
        )
        .expect("write definition");
        fs::create_dir_all(&paths.asset_root).expect("mkdir assets");
        fs::write(paths.asset_root.join(format!("{stem}.png")), b"png").expect("write png");
        fs::write(
            paths.asset_root.join(format!("{stem}_minimap.png")),
            b"minimap",
        )
        .expect("write minimap");
    }

    fn tree_snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        fn walk(dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
            let Ok(entries) = fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else {
                    out.insert(path.clone(), fs::read(&path).expect("read file"));
                }
            }
        }
        let mut out = BTreeMap::new();
        walk(root, &mut out);
        out
    }

    #[test]
    fn simulation_never_touches_the_filesystem() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_for(tmp.path());
        seed_group(&paths, "bp-orphan", "orphan");
        let groups = locate(&paths).expect("locate");
        let before = tree_snapshot(tmp.path());

        let out = execute(
            &groups,
            CleanupStrategy::Move,
            true,
            &paths,
            &CancelFlag::new(),
        );

        assert!(out.simulate);
        assert_eq!(out.attempted.len(), 3);
        assert_eq!(out.succeeded.len(), 3);
        assert!(out.failed.is_empty());
        assert_eq!(tree_snapshot(tmp.path()), before);
    }

    #[test]
    fn move_relocates_and_is_idempotent_on_rerun() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_for(tmp.path());
        seed_group(&paths, "bp-orphan", "orphan");
        let groups = locate(&paths).expect("locate");

        let first = execute(
            &groups,
            CleanupStrategy::Move,
            false,
            &paths,
            &CancelFlag::new(),
        );
        assert_eq!(first.succeeded.len(), 3);
        assert!(first.failed.is_empty());
        assert!(!paths.content_root.join("orphan.xml").exists());
        assert!(paths.quarantine_content_dir.join("orphan.xml").is_file());
        assert!(paths.quarantine_asset_dir.join("orphan.png").is_file());
        assert!(
            paths
                .quarantine_asset_dir
                .join("orphan_minimap.png")
                .is_file()
        );

        // Same groups, sources now absent: a no-op, not a failure.
        let second = execute(
            &groups,
            CleanupStrategy::Move,
            false,
            &paths,
            &CancelFlag::new(),
        );
        assert!(second.attempted.is_empty());
        assert!(second.failed.is_empty());
    }

    #[test]
    fn delete_rederives_asset_candidates_from_the_definition_name() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_for(tmp.path());
        seed_group(&paths, "bp-orphan", "orphan");
        let mut groups = locate(&paths).expect("locate");
        // Simulate incomplete asset resolution; delete must still find them.
        groups[0].assets = Default::default();

        let out = execute(
            &groups,
            CleanupStrategy::Delete,
            false,
            &paths,
            &CancelFlag::new(),
        );

        assert_eq!(out.succeeded.len(), 3);
        assert!(out.failed.is_empty());
        assert!(!paths.content_root.join("orphan.xml").exists());
        assert!(!paths.asset_root.join("orphan.png").exists());
        assert!(!paths.asset_root.join("orphan_minimap.png").exists());
    }

    #[test]
    fn backup_copy_verifies_then_removes_the_source() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_for(tmp.path());
        seed_group(&paths, "bp-orphan", "orphan");
        let groups = locate(&paths).expect("locate");

        let out = execute(
            &groups,
            CleanupStrategy::BackupCopy,
            false,
            &paths,
            &CancelFlag::new(),
        );

        assert_eq!(out.succeeded.len(), 3);
        assert!(out.failed.is_empty());
        assert!(!paths.content_root.join("orphan.xml").exists());
        let copied = paths.quarantine_asset_dir.join("orphan.png");
        assert_eq!(fs::read(copied).expect("read copy"), b"png");
    }

    #[test]
    fn cancellation_stops_the_batch_between_groups() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_for(tmp.path());
        seed_group(&paths, "bp-one", "one");
        seed_group(&paths, "bp-two", "two");
        let groups = locate(&paths).expect("locate");
        assert_eq!(groups.len(), 2);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let out = execute(&groups, CleanupStrategy::Move, false, &paths, &cancel);

        assert!(out.attempted.is_empty());
        assert!(paths.content_root.join("one.xml").exists());
        assert!(paths.content_root.join("two.xml").exists());
    }

    #[test]
    fn strategy_names_parse_including_the_backup_alias() {
        assert_eq!(CleanupStrategy::parse("move"), Some(CleanupStrategy::Move));
        assert_eq!(
            CleanupStrategy::parse("Backup-Copy"),
            Some(CleanupStrategy::BackupCopy)
        );
        assert_eq!(
            CleanupStrategy::parse("backup"),
            Some(CleanupStrategy::BackupCopy)
        );
        assert_eq!(CleanupStrategy::parse("shred"), None);
        assert_eq!(CleanupStrategy::Delete.as_str(), "delete");
    }
}
