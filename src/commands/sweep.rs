use crate::commands::CommandReport;
use crate::custodian::config;
use crate::custodian::paths;
use crate::custodian::retention;
use crate::custodian::util::{self, CancelFlag};
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub execute: bool,
}

pub fn run(opts: &SweepOptions) -> Result<CommandReport> {
    let cfg = config::load_config()?;
    let paths = paths::resolve_paths(&cfg)?;
    let simulate = !opts.execute;

    let mut report = CommandReport::new("sweep");
    report.detail(format!("quarantine_root={}", paths.quarantine_root.display()));
    report.detail(format!(
        "window_days={} simulate={simulate}",
        cfg.retention.days
    ));

    let now = util::now_epoch_secs()?;
    let swept = retention::sweep(
        &paths.quarantine_root,
        cfg.retention.days,
        now,
        simulate,
        &CancelFlag::new(),
    )?;

    for file in &swept.expired_files {
        report.detail(format!("expired: {}", file.display()));
    }
    report.detail(format!(
        "deleted={} pruned_dirs={}",
        swept.deleted_count, swept.pruned_empty_dirs
    ));

    Ok(report)
}
