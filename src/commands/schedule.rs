use anyhow::Result;

use crate::commands::CommandReport;
use crate::hot::config::load_config;
use crate::hot::paths::resolve_paths;
use crate::hot::scheduler;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOptions {
    pub once: bool,
}

pub fn run(opts: &ScheduleOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("schedule");

    if !opts.once {
        println!(
            "starting scheduler interval_secs={} lock={}",
            cfg.schedule.interval_secs,
            paths.logs_dir.join(scheduler::DAEMON_LOCK_FILE).display()
        );
        scheduler::run_daemon(&cfg, &paths)?;
        return Ok(report);
    }

    let firing = scheduler::run_firing(&cfg, &paths);
    for step in [&firing.crawl, &firing.archive] {
        for line in &step.lines {
            if step.ok {
                report.detail(line.clone());
            } else {
                report.issue(line.clone());
            }
        }
    }
    Ok(report)
}
