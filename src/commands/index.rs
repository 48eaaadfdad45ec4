use crate::commands::CommandReport;
use crate::custodian::config;
use crate::custodian::index::{self, StoreProbe};
use crate::custodian::paths;
use crate::custodian::report::{
    MANIFEST_VERSION, Manifest, utc_timestamp, write_discrepancy_report, write_manifest_atomic,
};
use crate::error::CustodianError;
use crate::store::rest::RestMetadataStore;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub validate: bool,
}

pub fn run(opts: &IndexOptions) -> Result<CommandReport> {
    let cfg = config::load_config()?;
    let paths = paths::resolve_paths(&cfg)?;
    let validate_files = cfg.store.validate_files || opts.validate;

    let mut report = CommandReport::new("index");
    report.detail(format!("content_root={}", paths.content_root.display()));

    let probe = match RestMetadataStore::from_env(cfg.store.timeout_secs) {
        Some(store) => index::probe_store(&store),
        None if cfg.store.allow_fallback => {
            StoreProbe::Unavailable("store credentials not configured".to_string())
        }
        None => {
            return Err(CustodianError::ConfigurationError(
                "store credentials absent and fallback disabled; set CUSTODIAN_STORE_URL and \
                 CUSTODIAN_STORE_KEY, or allow degraded output with CUSTODIAN_ALLOW_FALLBACK=true"
                    .to_string(),
            )
            .into());
        }
    };
    if let StoreProbe::Unavailable(reason) = &probe {
        report.detail(format!("store unavailable: {reason}"));
    }

    let generated_at = utc_timestamp();
    let outcome = index::build(probe, validate_files, &paths, &generated_at)?;
    let count = outcome.entries.len();

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        generated_at: generated_at.clone(),
        mode: outcome.mode.as_str(),
        count,
        entries: outcome.entries,
    };
    write_manifest_atomic(&paths.index_file, &manifest)?;

    report.detail(format!("mode={}", outcome.mode.as_str()));
    if outcome.mode.is_degraded() {
        report.detail("degraded mode: popularity statistics unavailable".to_string());
    }
    report.detail(format!("count={count}"));
    report.detail(format!(
        "stats: store_records={} disk_groups={} entries={} missing_on_disk={} discrepancies={}",
        outcome.stats.store_records,
        outcome.stats.disk_groups,
        outcome.stats.entries,
        outcome.stats.missing_on_disk,
        outcome.stats.discrepancies
    ));
    report.detail(format!("manifest={}", paths.index_file.display()));

    if !outcome.discrepancies.is_empty() {
        let discrepancy_path =
            write_discrepancy_report(&paths.repo_root, &generated_at, &outcome.discrepancies)?;
        report.issue(format!(
            "{} on-disk ids unknown to the store; see {}",
            outcome.discrepancies.len(),
            discrepancy_path.display()
        ));
    }

    Ok(report)
}
