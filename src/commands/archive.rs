use std::fs;

use anyhow::{Context, Result};

use crate::commands::CommandReport;
use crate::hot::archiver;
use crate::hot::config::load_config;
use crate::hot::index::HotIndex;
use crate::hot::paths::resolve_paths;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("archive");

    if let Some(parent) = paths.db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut index = HotIndex::open(&paths.db_path)
        .with_context(|| format!("failed to open index {}", paths.db_path.display()))?;
    let file_reports = archiver::run_pass(&mut index, &paths, cfg.window())?;

    for file in &file_reports {
        report.detail(file.summary());
    }
    report.detail("archiving finished");
    Ok(report)
}
