use anyhow::Result;

use crate::commands::CommandReport;
use crate::hot::config::load_config;
use crate::hot::crawl;
use crate::hot::paths::resolve_paths;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("crawl");

    let outcome = crawl::crawl_once(&cfg, &paths)?;
    report.detail(format!("snapshot={}", outcome.snapshot_path.display()));
    report.detail(format!("entries={}", outcome.entries));
    report.detail("crawling finished");
    Ok(report)
}
