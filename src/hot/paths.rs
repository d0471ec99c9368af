use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolved on-disk layout for one invocation.
#[derive(Debug, Clone)]
pub struct HotPaths {
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub archived_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
        _ => fallback,
    }
}

/// Everything roots at the invocation directory unless HOTBOARD_HOME or a
/// per-location override says otherwise. Pending snapshots sit directly in
/// the data dir; consumed ones move to the archived dir next to it.
pub fn resolve_paths() -> Result<HotPaths> {
    let cwd = env::current_dir().context("working directory could not be resolved")?;
    let home = env_or_default_path("HOTBOARD_HOME", cwd);

    let data_dir = env_or_default_path("HOTBOARD_DATA_DIR", home.clone());
    let archived_dir = env_or_default_path("HOTBOARD_ARCHIVED_DIR", home.join("archived"));
    let db_path = env_or_default_path("HOTBOARD_DB_PATH", home.join("hot.sqlite"));
    let logs_dir = env_or_default_path("HOTBOARD_LOGS_DIR", home.join("logs"));

    Ok(HotPaths {
        home,
        data_dir,
        archived_dir,
        db_path,
        logs_dir,
    })
}
