use crate::commands::CommandReport;
use crate::custodian::cleanup::{self, CleanupStrategy};
use crate::custodian::config;
use crate::custodian::locate;
use crate::custodian::paths;
use crate::custodian::reconcile;
use crate::custodian::report::write_cleanup_report;
use crate::custodian::retention;
use crate::custodian::util::{self, CancelFlag};
use crate::error::CustodianError;
use crate::store::MetadataStore;
use crate::store::rest::RestMetadataStore;
use anyhow::Result;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub execute: bool,
    pub strategy: Option<CleanupStrategy>,
}

pub fn run(opts: &ReconcileOptions) -> Result<CommandReport> {
    let cfg = config::load_config()?;
    let paths = paths::resolve_paths(&cfg)?;
    let cancel = CancelFlag::new();
    let simulate = !opts.execute;
    let strategy = opts.strategy.unwrap_or(cfg.cleanup.strategy);

    let mut report = CommandReport::new("reconcile");
    report.detail(format!("content_root={}", paths.content_root.display()));
    report.detail(format!("quarantine_root={}", paths.quarantine_root.display()));
    report.detail(format!(
        "strategy={} simulate={simulate}",
        strategy.as_str()
    ));

    // Retention is enforced on every run, even one that finds no new orphans.
    let now = util::now_epoch_secs()?;
    let swept = retention::sweep(
        &paths.quarantine_root,
        cfg.retention.days,
        now,
        simulate,
        &cancel,
    )?;
    report.detail(format!(
        "retention: deleted={} pruned_dirs={} window_days={}",
        swept.deleted_count, swept.pruned_empty_dirs, cfg.retention.days
    ));

    // No store, no reconciliation: the store is the sole arbiter of
    // validity and there is no safe destructive default without it.
    let store = RestMetadataStore::from_env(cfg.store.timeout_secs).ok_or_else(|| {
        CustodianError::ConfigurationError(
            "reconcile requires store credentials; set CUSTODIAN_STORE_URL and CUSTODIAN_STORE_KEY"
                .to_string(),
        )
    })?;
    let records = store.list_active_records()?;
    let active_ids: BTreeSet<String> = records
        .into_iter()
        .filter(|record| record.active)
        .map(|record| record.id)
        .collect();
    report.detail(format!("active_ids={}", active_ids.len()));

    let groups = locate::locate(&paths)?;
    let result = reconcile::reconcile(groups, &active_ids);
    let orphaned_bytes: u64 = result.orphaned.iter().map(|group| group.total_bytes).sum();
    report.detail(format!(
        "scanned={} valid={} orphaned={} orphaned_bytes={orphaned_bytes}",
        result.scanned(),
        result.valid.len(),
        result.orphaned.len()
    ));
    for group in &result.orphaned {
        report.detail(format!(
            "orphaned: id={} files={} bytes={}",
            group.id.as_deref().unwrap_or("unknown"),
            group.file_count(),
            group.total_bytes
        ));
    }

    let outcome = cleanup::execute(&result.orphaned, strategy, simulate, &paths, &cancel);
    report.detail(format!(
        "cleanup: attempted={} succeeded={} failed={}",
        outcome.attempted.len(),
        outcome.succeeded.len(),
        outcome.failed.len()
    ));
    for (path, reason) in &outcome.failed {
        report.issue(format!("{}: {reason}", path.display()));
    }

    let report_path = write_cleanup_report(&paths.repo_root, &result, simulate)?;
    report.detail(format!("report={}", report_path.display()));

    Ok(report)
}
