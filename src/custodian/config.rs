use crate::custodian::cleanup::CleanupStrategy;
use crate::custodian::warn::{self, WarnEvent};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/custodian_env_allowlist.rs"));
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub content_root: String,
    pub asset_root: String,
    pub quarantine_root: String,
    pub index_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            content_root: "blueprints".to_string(),
            asset_root: "images".to_string(),
            quarantine_root: ".cleanup".to_string(),
            index_file: "index.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub days: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { days: 7 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub strategy: CleanupStrategy,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            strategy: CleanupStrategy::Move,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub timeout_secs: u64,
    pub validate_files: bool,
    pub allow_fallback: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            validate_files: false,
            allow_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustodianConfig {
    pub layout: LayoutConfig,
    pub retention: RetentionConfig,
    pub cleanup: CleanupConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialCustodianConfig {
    layout: Option<LayoutConfig>,
    retention: Option<RetentionConfig>,
    cleanup: Option<CleanupConfig>,
    store: Option<StoreConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_strategy(var: &str, fallback: CleanupStrategy) -> CleanupStrategy {
    match env::var(var) {
        Ok(v) => CleanupStrategy::parse(&v).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn validate(cfg: &CustodianConfig) -> Result<()> {
    if cfg.retention.days == 0 {
        return Err(anyhow!("invalid retention days: must be >= 1"));
    }
    if cfg.store.timeout_secs == 0 {
        return Err(anyhow!("invalid store timeout: must be >= 1 second"));
    }
    if cfg.layout.content_root.trim().is_empty() {
        return Err(anyhow!("invalid content root: cannot be empty"));
    }
    if cfg.layout.asset_root.trim().is_empty() {
        return Err(anyhow!("invalid asset root: cannot be empty"));
    }
    if cfg.layout.quarantine_root.trim().is_empty() {
        return Err(anyhow!("invalid quarantine root: cannot be empty"));
    }
    if cfg.layout.quarantine_root == cfg.layout.content_root {
        return Err(anyhow!(
            "invalid layout: quarantine root must differ from content root"
        ));
    }
    if cfg.layout.index_file.trim().is_empty() {
        return Err(anyhow!("invalid index file: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("CUSTODIAN_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    Some(PathBuf::from("custodian.toml"))
}

fn merge_file_config(base: &mut CustodianConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialCustodianConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse custodian config {}: {err}", path.display()))?;
    if let Some(layout) = parsed.layout {
        base.layout = layout;
    }
    if let Some(retention) = parsed.retention {
        base.retention = retention;
    }
    if let Some(cleanup) = parsed.cleanup {
        base.cleanup = cleanup;
    }
    if let Some(store) = parsed.store {
        base.store = store;
    }
    Ok(())
}

fn warn_unrecognized_env() {
    for (key, _) in env::vars() {
        if !key.starts_with("CUSTODIAN_") {
            continue;
        }
        if generated::GENERATED_ENV_ALLOWLIST.contains(&key.as_str()) {
            continue;
        }
        warn::emit(WarnEvent {
            code: "UNRECOGNIZED_ENV",
            stage: "config",
            path: &key,
            reason: "env-var-not-recognized",
            err: "check spelling against documented CUSTODIAN_ variables",
        });
    }
}

pub fn load_config() -> Result<CustodianConfig> {
    let mut cfg = CustodianConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.layout.content_root = env_or_string("CUSTODIAN_CONTENT_ROOT", &cfg.layout.content_root);
    cfg.layout.asset_root = env_or_string("CUSTODIAN_ASSET_ROOT", &cfg.layout.asset_root);
    cfg.layout.quarantine_root =
        env_or_string("CUSTODIAN_QUARANTINE_ROOT", &cfg.layout.quarantine_root);
    cfg.layout.index_file = env_or_string("CUSTODIAN_INDEX_FILE", &cfg.layout.index_file);
    cfg.retention.days = env_or_u64("CUSTODIAN_RETENTION_DAYS", cfg.retention.days);
    cfg.cleanup.strategy = env_or_strategy("CUSTODIAN_STRATEGY", cfg.cleanup.strategy);
    cfg.store.timeout_secs = env_or_u64("CUSTODIAN_STORE_TIMEOUT_SECS", cfg.store.timeout_secs);
    cfg.store.validate_files = env_or_bool("CUSTODIAN_VALIDATE_FILES", cfg.store.validate_files);
    cfg.store.allow_fallback = env_or_bool("CUSTODIAN_ALLOW_FALLBACK", cfg.store.allow_fallback);

    warn_unrecognized_env();
    validate(&cfg)?;
    Ok(cfg)
}
