use crate::custodian::config::CustodianConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Resolved directory layout for one run. All paths are anchored at the
/// repository root so the tool behaves the same no matter where reports
/// and quarantine live inside it.
#[derive(Debug, Clone)]
pub struct CustodianPaths {
    pub repo_root: PathBuf,
    pub content_root: PathBuf,
    pub asset_root: PathBuf,
    pub quarantine_root: PathBuf,
    pub quarantine_content_dir: PathBuf,
    pub quarantine_asset_dir: PathBuf,
    pub index_file: PathBuf,
}

fn resolve_repo_root() -> Result<PathBuf> {
    if let Ok(custom) = env::var("CUSTODIAN_REPO_ROOT") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    env::current_dir().context("failed to resolve current directory")
}

pub fn resolve_paths(cfg: &CustodianConfig) -> Result<CustodianPaths> {
    let repo_root = resolve_repo_root()?;
    let content_root = repo_root.join(&cfg.layout.content_root);
    let asset_root = repo_root.join(&cfg.layout.asset_root);
    let quarantine_root = repo_root.join(&cfg.layout.quarantine_root);
    let quarantine_content_dir = quarantine_root.join(&cfg.layout.content_root);
    let quarantine_asset_dir = quarantine_root.join(&cfg.layout.asset_root);
    let index_file = repo_root.join(&cfg.layout.index_file);

    Ok(CustodianPaths {
        repo_root,
        content_root,
        asset_root,
        quarantine_root,
        quarantine_content_dir,
        quarantine_asset_dir,
        index_file,
    })
}
