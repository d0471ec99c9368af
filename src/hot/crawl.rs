use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::hot::config::Config;
use crate::hot::paths::HotPaths;
use crate::hot::snapshot::{self, Entry};
use crate::hot::util;

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub snapshot_path: PathBuf,
    pub entries: usize,
}

pub fn fetch_board(cfg: &Config) -> Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.crawl.timeout_secs))
        .user_agent(cfg.crawl.user_agent.as_str())
        .build()
        .context("failed to build http client")?;

    let response = client
        .get(&cfg.crawl.url)
        .send()
        .with_context(|| format!("failed to fetch {}", cfg.crawl.url))?;
    if !response.status().is_success() {
        anyhow::bail!("board fetch failed with status {}", response.status());
    }
    response.text().context("failed to read board page body")
}

fn parsed_selector(label: &str, value: &str) -> Result<Selector> {
    Selector::parse(value).map_err(|err| anyhow!("invalid {label} selector {value:?}: {err}"))
}

fn element_text(element: &ElementRef<'_>) -> String {
    let mut out = String::new();
    for piece in element.text() {
        out.push_str(piece);
    }
    out
}

/// Pull (title, summary) pairs out of the board markup. A block missing
/// either node is skipped, as is a block whose sanitized title is empty.
pub fn extract_entries(html: &str, cfg: &Config) -> Result<Vec<Entry>> {
    let block_sel = parsed_selector("entry", &cfg.crawl.entry_selector)?;
    let title_sel = parsed_selector("title", &cfg.crawl.title_selector)?;
    let summary_sel = parsed_selector("summary", &cfg.crawl.summary_selector)?;

    let document = Html::parse_document(html);
    let mut entries = Vec::new();
    for block in document.select(&block_sel) {
        let Some(title_node) = block.select(&title_sel).next() else {
            continue;
        };
        let Some(summary_node) = block.select(&summary_sel).next() else {
            continue;
        };

        let title = snapshot::sanitize_line(&element_text(&title_node));
        if title.is_empty() {
            continue;
        }
        let summary = snapshot::sanitize_line(&element_text(&summary_node));
        entries.push(Entry { title, summary });
    }
    Ok(entries)
}

/// Write one snapshot of `entries` harvested at `at`. The body is staged in
/// a temp file and renamed into place so an archival pass never reads a
/// half-written snapshot.
pub fn write_snapshot(
    paths: &HotPaths,
    at: NaiveDateTime,
    entries: &[Entry],
) -> Result<CrawlOutcome> {
    fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("failed to create {}", paths.data_dir.display()))?;

    let snapshot_path = paths.data_dir.join(snapshot::snapshot_filename(at));
    let mut staged = tempfile::NamedTempFile::new_in(&paths.data_dir)
        .with_context(|| format!("failed to stage snapshot in {}", paths.data_dir.display()))?;
    staged
        .write_all(snapshot::encode_body(entries).as_bytes())
        .context("failed to write staged snapshot")?;
    staged
        .persist(&snapshot_path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to persist {}", snapshot_path.display()))?;

    Ok(CrawlOutcome {
        snapshot_path,
        entries: entries.len(),
    })
}

/// Fetch the configured board once and write the resulting snapshot.
pub fn crawl_once(cfg: &Config, paths: &HotPaths) -> Result<CrawlOutcome> {
    let html = fetch_board(cfg)?;
    let entries = extract_entries(&html, cfg)?;
    let tz = cfg.timezone()?;
    write_snapshot(paths, util::now_in(&tz), &entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hot::snapshot::parse_stamp;
    use tempfile::tempdir;

    const BOARD_PAGE: &str = r#"
        <html><body>
          <div class="content_1YWBm">
            <div class="c-single-text-ellipsis"> festival opens </div>
            <div class="small_Uvkd3">crowds gather
downtown</div>
          </div>
          <div class="content_1YWBm">
            <div class="c-single-text-ellipsis">headline without summary</div>
          </div>
          <div class="content_1YWBm">
            <div class="c-single-text-ellipsis">   </div>
            <div class="small_Uvkd3">summary under a blank title</div>
          </div>
          <div class="content_1YWBm">
            <div class="c-single-text-ellipsis">market rally</div>
            <div class="small_Uvkd3">stocks climb</div>
          </div>
        </body></html>
    "#;

    #[test]
    fn extraction_skips_incomplete_blocks_and_sanitizes_text() {
        let cfg = Config::default();
        let entries = extract_entries(BOARD_PAGE, &cfg).expect("extract");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "festival opens");
        assert_eq!(entries[0].summary, "crowds gather downtown");
        assert_eq!(entries[1].title, "market rally");
        assert_eq!(entries[1].summary, "stocks climb");
    }

    #[test]
    fn extraction_respects_configured_selectors() {
        let mut cfg = Config::default();
        cfg.crawl.entry_selector = "li.topic".to_string();
        cfg.crawl.title_selector = "span.t".to_string();
        cfg.crawl.summary_selector = "span.s".to_string();

        let html = r#"<ul>
            <li class="topic"><span class="t">alpha</span><span class="s">one</span></li>
            <li class="topic"><span class="t">beta</span><span class="s">two</span></li>
        </ul>"#;
        let entries = extract_entries(html, &cfg).expect("extract");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "beta");
        assert_eq!(entries[1].summary, "two");
    }

    #[test]
    fn snapshot_write_lands_at_the_stamped_name_only() {
        let tmp = tempdir().expect("tempdir");
        let paths = crate::hot::paths::HotPaths {
            home: tmp.path().to_path_buf(),
            data_dir: tmp.path().join("data"),
            archived_dir: tmp.path().join("archived"),
            db_path: tmp.path().join("hot.sqlite"),
            logs_dir: tmp.path().join("logs"),
        };
        let at = parse_stamp("2024-03-04-05-06-07").expect("stamp");
        let entries = vec![Entry {
            title: "festival opens".to_string(),
            summary: "day one".to_string(),
        }];

        let outcome = write_snapshot(&paths, at, &entries).expect("write");
        assert_eq!(
            outcome.snapshot_path,
            paths.data_dir.join("2024-03-04-05-06-07.hot.txt")
        );
        assert_eq!(
            fs::read_to_string(&outcome.snapshot_path).expect("read"),
            "festival opens\nday one\n"
        );

        let names: Vec<_> = fs::read_dir(&paths.data_dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
