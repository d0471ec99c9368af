use std::fs;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use fs2::FileExt;

use crate::hot::archiver::{self, ArchiveReport};
use crate::hot::audit;
use crate::hot::config::Config;
use crate::hot::crawl;
use crate::hot::index::HotIndex;
use crate::hot::paths::HotPaths;

pub const DAEMON_LOCK_FILE: &str = "hotboard-schedule.lock";

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub ok: bool,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FiringOutcome {
    pub crawl: StepOutcome,
    pub archive: StepOutcome,
}

/// One scheduled firing: harvest a snapshot, then run an archival pass.
/// The steps are isolated; either may fail without suppressing the other,
/// and failures are audited rather than propagated.
pub fn run_firing(cfg: &Config, paths: &HotPaths) -> FiringOutcome {
    let crawl = match crawl::crawl_once(cfg, paths) {
        Ok(outcome) => {
            let note = format!(
                "snapshot={} entries={}",
                outcome.snapshot_path.display(),
                outcome.entries
            );
            let _ = audit::append_event(paths, "crawl", "ok", &note);
            StepOutcome {
                ok: true,
                lines: vec![note, "crawling finished".to_string()],
            }
        }
        Err(err) => {
            let _ = audit::append_event(paths, "crawl", "degraded", &format!("{err:#}"));
            StepOutcome {
                ok: false,
                lines: vec![format!("crawling error: {err:#}")],
            }
        }
    };

    let archive = match archive_step(cfg, paths) {
        Ok(reports) => {
            let accepted: usize = reports.iter().map(|report| report.accepted).sum();
            let duplicates: usize = reports.iter().map(|report| report.duplicates).sum();
            let _ = audit::append_event(
                paths,
                "archive",
                "ok",
                &format!(
                    "files={} accepted={accepted} duplicates={duplicates}",
                    reports.len()
                ),
            );
            let mut lines: Vec<String> = reports.iter().map(ArchiveReport::summary).collect();
            lines.push("archiving finished".to_string());
            StepOutcome { ok: true, lines }
        }
        Err(err) => {
            let _ = audit::append_event(paths, "archive", "degraded", &format!("{err:#}"));
            StepOutcome {
                ok: false,
                lines: vec![format!("archiving error: {err:#}")],
            }
        }
    };

    FiringOutcome { crawl, archive }
}

fn archive_step(cfg: &Config, paths: &HotPaths) -> Result<Vec<ArchiveReport>> {
    if let Some(parent) = paths.db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut index = HotIndex::open(&paths.db_path)
        .with_context(|| format!("failed to open index {}", paths.db_path.display()))?;
    Ok(archiver::run_pass(&mut index, paths, cfg.window())?)
}

/// Fixed-cadence loop. Holds an exclusive lock so only one scheduler runs
/// against the layout, and skips firings that fell due while the previous
/// one was still running.
pub fn run_daemon(cfg: &Config, paths: &HotPaths) -> Result<()> {
    let _lock = acquire_daemon_lock(paths)?;
    let interval = Duration::from_secs(cfg.schedule.interval_secs);

    loop {
        let started = Instant::now();
        let firing = run_firing(cfg, paths);
        for line in firing.crawl.lines.iter().chain(firing.archive.lines.iter()) {
            println!("{line}");
        }

        let mut next_due = started + interval;
        let now = Instant::now();
        let mut skipped = 0u32;
        while next_due <= now {
            next_due += interval;
            skipped += 1;
        }
        if skipped > 0 {
            let _ = audit::append_event(
                paths,
                "schedule",
                "skipped",
                &format!("missed_firings={skipped}"),
            );
        }
        thread::sleep(next_due - now);
    }
}

fn acquire_daemon_lock(paths: &HotPaths) -> Result<fs::File> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let lock_path = paths.logs_dir.join(DAEMON_LOCK_FILE);

    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    file.try_lock_exclusive()
        .map_err(|_| anyhow!("another scheduler already holds {}", lock_path.display()))?;

    file.set_len(0)
        .with_context(|| format!("failed to truncate {}", lock_path.display()))?;
    writeln!(file, "{}", std::process::id())
        .with_context(|| format!("failed to record pid in {}", lock_path.display()))?;
    Ok(file)
}
