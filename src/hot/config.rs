use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Duration;
use chrono_tz::Tz;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::hot::dedup::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub timezone: String,
    pub entry_selector: String,
    pub title_selector: String,
    pub summary_selector: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            url: "https://top.baidu.com/board?tab=realtime".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/101.0.4951.54 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
            timezone: "Asia/Chongqing".to_string(),
            entry_selector: "div.content_1YWBm".to_string(),
            title_selector: "div.c-single-text-ellipsis".to_string(),
            summary_selector: "div.small_Uvkd3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_secs: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub window_days: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub schedule: ScheduleConfig,
    pub dedup: DedupConfig,
}

impl Config {
    /// Dedup window as a signed duration.
    pub fn window(&self) -> Duration {
        Duration::days(self.dedup.window_days as i64)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.crawl
            .timezone
            .parse::<Tz>()
            .map_err(|err| anyhow!("invalid timezone {}: {err}", self.crawl.timezone))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    crawl: Option<CrawlConfig>,
    schedule: Option<ScheduleConfig>,
    dedup: Option<DedupConfig>,
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(value) => value.trim().parse().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("HOTBOARD_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".hotboard").join("config.toml"))
}

fn merge_file_config(base: &mut Config) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|err| anyhow!("failed to read config {}: {err}", path.display()))?;
    let parsed: PartialConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;

    if let Some(crawl) = parsed.crawl {
        base.crawl = crawl;
    }
    if let Some(schedule) = parsed.schedule {
        base.schedule = schedule;
    }
    if let Some(dedup) = parsed.dedup {
        base.dedup = dedup;
    }
    Ok(())
}

fn parse_selector(label: &str, value: &str) -> Result<()> {
    Selector::parse(value).map_err(|err| anyhow!("invalid {label} selector {value:?}: {err}"))?;
    Ok(())
}

fn validate(cfg: &Config) -> Result<()> {
    if cfg.crawl.url.trim().is_empty() {
        return Err(anyhow!("invalid board url: cannot be empty"));
    }
    if cfg.crawl.timeout_secs == 0 {
        return Err(anyhow!("invalid http timeout: must be >= 1 second"));
    }
    cfg.timezone()?;
    parse_selector("entry", &cfg.crawl.entry_selector)?;
    parse_selector("title", &cfg.crawl.title_selector)?;
    parse_selector("summary", &cfg.crawl.summary_selector)?;
    if cfg.schedule.interval_secs == 0 {
        return Err(anyhow!("invalid schedule interval: must be >= 1 second"));
    }
    if cfg.dedup.window_days == 0 {
        return Err(anyhow!("invalid dedup window: must be >= 1 day"));
    }
    Ok(())
}

/// Defaults, overlaid by the optional config file, overlaid by HOTBOARD_*
/// environment variables, then validated as a whole.
pub fn load_config() -> Result<Config> {
    let mut cfg = Config::default();
    merge_file_config(&mut cfg)?;

    cfg.crawl.url = env_or_string("HOTBOARD_BOARD_URL", &cfg.crawl.url);
    cfg.crawl.user_agent = env_or_string("HOTBOARD_USER_AGENT", &cfg.crawl.user_agent);
    cfg.crawl.timeout_secs = env_or_u64("HOTBOARD_HTTP_TIMEOUT_SECS", cfg.crawl.timeout_secs);
    cfg.crawl.timezone = env_or_string("HOTBOARD_TIMEZONE", &cfg.crawl.timezone);
    cfg.crawl.entry_selector = env_or_string("HOTBOARD_ENTRY_SELECTOR", &cfg.crawl.entry_selector);
    cfg.crawl.title_selector = env_or_string("HOTBOARD_TITLE_SELECTOR", &cfg.crawl.title_selector);
    cfg.crawl.summary_selector =
        env_or_string("HOTBOARD_SUMMARY_SELECTOR", &cfg.crawl.summary_selector);
    cfg.schedule.interval_secs = env_or_u64("HOTBOARD_INTERVAL_SECS", cfg.schedule.interval_secs);
    cfg.dedup.window_days = env_or_u64("HOTBOARD_DEDUP_WINDOW_DAYS", cfg.dedup.window_days);

    validate(&cfg)?;
    Ok(cfg)
}
