use std::env;
use std::path::Path;

use anyhow::Result;

use crate::commands::CommandReport;
use crate::error::ArchiveError;
use crate::hot::config::load_config;
use crate::hot::index::{self, HotIndex};
use crate::hot::paths::resolve_paths;
use crate::hot::scheduler::DAEMON_LOCK_FILE;
use crate::hot::snapshot;

/// Environment overrides the binary recognizes, listed so `status` can show
/// which ones are active.
const ENV_OVERRIDES: &[&str] = &[
    "HOTBOARD_HOME",
    "HOTBOARD_DATA_DIR",
    "HOTBOARD_ARCHIVED_DIR",
    "HOTBOARD_DB_PATH",
    "HOTBOARD_LOGS_DIR",
    "HOTBOARD_CONFIG_PATH",
    "HOTBOARD_BOARD_URL",
    "HOTBOARD_USER_AGENT",
    "HOTBOARD_HTTP_TIMEOUT_SECS",
    "HOTBOARD_TIMEZONE",
    "HOTBOARD_ENTRY_SELECTOR",
    "HOTBOARD_TITLE_SELECTOR",
    "HOTBOARD_SUMMARY_SELECTOR",
    "HOTBOARD_INTERVAL_SECS",
    "HOTBOARD_DEDUP_WINDOW_DAYS",
];

fn indexed_rows(db_path: &Path) -> Result<i64, ArchiveError> {
    let index = HotIndex::open(db_path)?;
    index.ensure_schema()?;
    index::count_rows(index.connection())
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("data_dir={}", paths.data_dir.display()));
    report.detail(format!("archived_dir={}", paths.archived_dir.display()));
    report.detail(format!("db_path={}", paths.db_path.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    match load_config() {
        Ok(cfg) => {
            report.detail(format!("board_url={}", cfg.crawl.url));
            report.detail(format!("timezone={}", cfg.crawl.timezone));
            report.detail(format!("interval_secs={}", cfg.schedule.interval_secs));
            report.detail(format!("dedup_window_days={}", cfg.dedup.window_days));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    match snapshot::list_pending(&paths.data_dir) {
        Ok(pending) => report.detail(format!("pending_snapshots={}", pending.len())),
        Err(err) => report.issue(format!("pending snapshots unreadable: {err}")),
    }

    if paths.db_path.exists() {
        match indexed_rows(&paths.db_path) {
            Ok(rows) => report.detail(format!("indexed_rows={rows}")),
            Err(err) => report.issue(format!("index unreadable: {err}")),
        }
    } else {
        report.detail("index not created yet");
    }

    let lock_path = paths.logs_dir.join(DAEMON_LOCK_FILE);
    if lock_path.exists() {
        report.detail(format!("scheduler_lock={}", lock_path.display()));
    }

    for var in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            if !value.trim().is_empty() {
                report.detail(format!("env {var}={value}"));
            }
        }
    }

    Ok(report)
}
