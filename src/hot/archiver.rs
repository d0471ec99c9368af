//! The archival pass: fold pending snapshot files into the durable index.
//!
//! One pass is one transaction. Files are consumed in ascending stamp order
//! so earlier harvests win ties inside the dedup window, and each file is
//! relocated to the archived area before the transaction commits. A crash
//! between a relocation and the commit leaves files retired whose rows were
//! rolled back; a re-run then skips those files instead of double-inserting
//! their rows after the dedup window has drifted.

use std::fs;

use chrono::{Duration, NaiveDateTime};

use crate::error::ArchiveError;
use crate::hot::dedup::{self, Candidate, Verdict};
use crate::hot::index::{self, HotIndex};
use crate::hot::paths::HotPaths;
use crate::hot::snapshot;

/// Tally for one consumed snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    pub source: String,
    pub total: usize,
    pub accepted: usize,
    pub duplicates: usize,
}

impl ArchiveReport {
    pub fn summary(&self) -> String {
        format!(
            "archive {} {}/{}/{}",
            self.source, self.accepted, self.duplicates, self.total
        )
    }
}

/// Run one archival pass over every pending snapshot.
///
/// With nothing pending this returns an empty report list without touching
/// the archived directory or the store. Any error aborts the remaining
/// files and rolls the whole pass back.
pub fn run_pass(
    index: &mut HotIndex,
    paths: &HotPaths,
    window: Duration,
) -> Result<Vec<ArchiveReport>, ArchiveError> {
    index.ensure_schema()?;

    let pending = snapshot::list_pending(&paths.data_dir)?;
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(&paths.archived_dir)
        .map_err(|source| ArchiveError::io(&paths.archived_dir, source))?;

    let tx = index.transaction()?;
    let mut reports = Vec::with_capacity(pending.len());
    let mut prev: Option<(String, NaiveDateTime)> = None;

    for name in &pending {
        let observed_at = snapshot::stamp_from_filename(name)?;
        if let Some((prev_name, prev_at)) = &prev {
            if observed_at < *prev_at {
                return Err(ArchiveError::OutOfOrder {
                    name: name.clone(),
                    prev: prev_name.clone(),
                });
            }
        }
        prev = Some((name.clone(), observed_at));

        let path = paths.data_dir.join(name);
        let raw = fs::read_to_string(&path).map_err(|source| ArchiveError::io(&path, source))?;
        let entries = snapshot::parse_body(&raw);
        let date = snapshot::format_stamp(observed_at);

        let mut accepted = 0usize;
        let mut duplicates = 0usize;
        for entry in &entries {
            let candidate = Candidate {
                title: &entry.title,
                observed_at,
            };
            match dedup::decide(&*tx, &candidate, window)? {
                Verdict::Fresh => {
                    index::insert_sighting(&tx, &date, &entry.title, &entry.summary)?;
                    accepted += 1;
                }
                Verdict::Repeat => duplicates += 1,
            }
        }

        reports.push(ArchiveReport {
            source: name.clone(),
            total: entries.len(),
            accepted,
            duplicates,
        });

        snapshot::retire(&path, &paths.archived_dir.join(name))?;
    }

    tx.commit()?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn sandbox_paths(root: &Path) -> HotPaths {
        HotPaths {
            home: root.to_path_buf(),
            data_dir: root.to_path_buf(),
            archived_dir: root.join("archived"),
            db_path: root.join("hot.sqlite"),
            logs_dir: root.join("logs"),
        }
    }

    fn week() -> Duration {
        Duration::days(7)
    }

    #[test]
    fn pass_accepts_fresh_titles_and_rejects_recent_repeats() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        fs::write(
            tmp.path().join("2024-01-01-00-00-00.hot.txt"),
            "festival opens\ncrowds gather\nstorm warning\ncoastal alert\n",
        )
        .expect("write first");
        fs::write(
            tmp.path().join("2024-01-02-00-00-00.hot.txt"),
            "festival opens\nsecond day\nmarket rally\nstocks climb\n",
        )
        .expect("write second");

        let mut index = HotIndex::open_in_memory().expect("open");
        let reports = run_pass(&mut index, &paths, week()).expect("pass");

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].summary(),
            "archive 2024-01-01-00-00-00.hot.txt 2/0/2"
        );
        assert_eq!(
            reports[1].summary(),
            "archive 2024-01-02-00-00-00.hot.txt 1/1/2"
        );

        assert_eq!(index::count_rows(index.connection()).expect("count"), 3);
        assert!(
            paths
                .archived_dir
                .join("2024-01-01-00-00-00.hot.txt")
                .exists()
        );
        assert!(
            paths
                .archived_dir
                .join("2024-01-02-00-00-00.hot.txt")
                .exists()
        );
        assert!(!tmp.path().join("2024-01-02-00-00-00.hot.txt").exists());

        // Nothing pending anymore, so a re-run is a no-op.
        let reports = run_pass(&mut index, &paths, week()).expect("rerun");
        assert!(reports.is_empty());
        assert_eq!(index::count_rows(index.connection()).expect("count"), 3);
    }

    #[test]
    fn empty_directory_leaves_no_trace() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        fs::write(tmp.path().join("notes.txt"), "not a snapshot\n").expect("write decoy");

        let mut index = HotIndex::open_in_memory().expect("open");
        let reports = run_pass(&mut index, &paths, week()).expect("pass");

        assert!(reports.is_empty());
        assert!(!paths.archived_dir.exists());
    }

    #[test]
    fn malformed_stamp_aborts_before_any_relocation() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        fs::write(tmp.path().join("yesterday.hot.txt"), "a\nb\n").expect("write");

        let mut index = HotIndex::open_in_memory().expect("open");
        let err = run_pass(&mut index, &paths, week()).expect_err("must fail");

        assert!(matches!(err, ArchiveError::MalformedStamp { .. }));
        assert!(tmp.path().join("yesterday.hot.txt").exists());
        assert_eq!(index::count_rows(index.connection()).expect("count"), 0);
    }

    #[test]
    fn stamps_that_sort_against_chronology_are_rejected() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        // "2024-08-15..." sorts before "2024-1-16..." yet stamps later.
        fs::write(tmp.path().join("2024-08-15-00-00-00.hot.txt"), "a\nb\n").expect("write");
        fs::write(tmp.path().join("2024-1-16-00-00-00.hot.txt"), "c\nd\n").expect("write");

        let mut index = HotIndex::open_in_memory().expect("open");
        let err = run_pass(&mut index, &paths, week()).expect_err("must fail");

        assert!(matches!(err, ArchiveError::OutOfOrder { .. }));
        assert_eq!(index::count_rows(index.connection()).expect("count"), 0);
    }

    #[test]
    fn failure_mid_pass_rolls_back_every_row() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        fs::write(
            tmp.path().join("2024-01-01-00-00-00.hot.txt"),
            "storm warning\ncoastal alert\n",
        )
        .expect("write first");
        fs::write(
            tmp.path().join("2024-01-02-00-00-00.hot.txt"),
            "festival opens\nsecond day\n",
        )
        .expect("write second");

        let mut index = HotIndex::open_in_memory().expect("open");
        index.ensure_schema().expect("schema");
        // A pre-existing row whose date no longer parses poisons the lookup
        // for "festival opens".
        index::insert_sighting(index.connection(), "corrupt", "festival opens", "").expect("seed");

        let err = run_pass(&mut index, &paths, week()).expect_err("must fail");
        assert!(matches!(err, ArchiveError::MalformedRow { .. }));

        // Only the seeded row survives. The first file's accept rolled back
        // even though that file was already relocated.
        assert_eq!(index::count_rows(index.connection()).expect("count"), 1);
        assert!(
            paths
                .archived_dir
                .join("2024-01-01-00-00-00.hot.txt")
                .exists()
        );
        assert!(tmp.path().join("2024-01-02-00-00-00.hot.txt").exists());
    }

    #[test]
    fn repeats_age_out_across_passes() {
        let tmp = tempdir().expect("tempdir");
        let paths = sandbox_paths(tmp.path());
        let mut index = HotIndex::open_in_memory().expect("open");

        fs::write(
            tmp.path().join("2024-01-01-00-00-00.hot.txt"),
            "festival opens\nday one\n",
        )
        .expect("write");
        run_pass(&mut index, &paths, week()).expect("first pass");

        fs::write(
            tmp.path().join("2024-01-07-23-59-59.hot.txt"),
            "festival opens\nstill hot\n",
        )
        .expect("write");
        let reports = run_pass(&mut index, &paths, week()).expect("second pass");
        assert_eq!(reports[0].accepted, 0);
        assert_eq!(reports[0].duplicates, 1);

        fs::write(
            tmp.path().join("2024-01-08-00-00-01.hot.txt"),
            "festival opens\nback again\n",
        )
        .expect("write");
        let reports = run_pass(&mut index, &paths, week()).expect("third pass");
        assert_eq!(reports[0].accepted, 1);
        assert_eq!(index::count_rows(index.connection()).expect("count"), 2);
    }
}
