use crate::custodian::util::{self, CancelFlag};
use crate::custodian::warn::{self, WarnEvent};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Result of one retention pass over the quarantine tree.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub deleted_count: usize,
    pub pruned_empty_dirs: usize,
    pub expired_files: Vec<PathBuf>,
}

/// A file is expired once its modification time falls before the retention
/// cutoff. The sweeper inspects nothing but mtimes; it does not care which
/// cleanup strategy put a file in quarantine.
pub fn is_expired(modified_epoch_secs: u64, now_epoch_secs: u64, retention_days: u64) -> bool {
    let cutoff = now_epoch_secs.saturating_sub(retention_days * SECONDS_PER_DAY);
    modified_epoch_secs < cutoff
}

fn collect_tree(dir: &Path, files: &mut Vec<PathBuf>, dirs: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path.clone());
            collect_tree(&path, files, dirs)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Delete quarantined files older than the retention window, then prune
/// directories the deletions emptied, bottom-up. Simulation reports the
/// same counts without mutating anything.
pub fn sweep(
    quarantine_root: &Path,
    retention_days: u64,
    now_epoch_secs: u64,
    simulate: bool,
    cancel: &CancelFlag,
) -> Result<SweepOutcome> {
    let mut out = SweepOutcome::default();
    if !quarantine_root.is_dir() {
        return Ok(out);
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    collect_tree(quarantine_root, &mut files, &mut dirs)?;
    files.sort();

    for file in files {
        if cancel.is_cancelled() {
            return Ok(out);
        }
        let modified = match util::modified_epoch_secs(&file) {
            Ok(modified) => modified,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "SWEEP_STAT_FAILED",
                    stage: "retention",
                    path: &file.display().to_string(),
                    reason: "skipping-file",
                    err: &format!("{err:#}"),
                });
                continue;
            }
        };
        if !is_expired(modified, now_epoch_secs, retention_days) {
            continue;
        }

        if simulate {
            out.deleted_count += 1;
            out.expired_files.push(file);
            continue;
        }
        match fs::remove_file(&file) {
            Ok(()) => {
                out.deleted_count += 1;
                out.expired_files.push(file);
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "SWEEP_DELETE_FAILED",
                    stage: "retention",
                    path: &file.display().to_string(),
                    reason: "continuing-with-next-file",
                    err: &err.to_string(),
                });
            }
        }
    }

    // Deepest directories first so a chain of emptied parents collapses in
    // a single pass.
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    for dir in dirs {
        if simulate {
            if dir_is_empty(&dir) {
                out.pruned_empty_dirs += 1;
            }
            continue;
        }
        if fs::remove_dir(&dir).is_ok() {
            out.pruned_empty_dirs += 1;
        }
    }

    Ok(out)
}
