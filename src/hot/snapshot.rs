use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::ArchiveError;

pub const SNAPSHOT_SUFFIX: &str = ".hot.txt";
pub const STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// One observed topic. The title is the dedup key; the summary rides along
/// verbatim into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub summary: String,
}

pub fn format_stamp(at: NaiveDateTime) -> String {
    at.format(STAMP_FORMAT).to_string()
}

pub fn parse_stamp(value: &str) -> Result<NaiveDateTime, ArchiveError> {
    NaiveDateTime::parse_from_str(value, STAMP_FORMAT).map_err(|source| {
        ArchiveError::MalformedStamp {
            value: value.to_string(),
            source,
        }
    })
}

pub fn snapshot_filename(at: NaiveDateTime) -> String {
    format!("{}{}", format_stamp(at), SNAPSHOT_SUFFIX)
}

/// Recover the harvest time embedded in a snapshot filename.
pub fn stamp_from_filename(name: &str) -> Result<NaiveDateTime, ArchiveError> {
    parse_stamp(name.strip_suffix(SNAPSHOT_SUFFIX).unwrap_or(name))
}

pub fn encode_body(entries: &[Entry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.title);
        out.push('\n');
        out.push_str(&entry.summary);
        out.push('\n');
    }
    out
}

/// Split a snapshot body into title/summary pairs. Lines pair up in file
/// order; a surplus trailing line has no partner and is dropped.
pub fn parse_body(raw: &str) -> Vec<Entry> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let pairs = lines.len() / 2;
    let mut entries = Vec::with_capacity(pairs);
    for i in 0..pairs {
        entries.push(Entry {
            title: lines[i * 2].to_string(),
            summary: lines[i * 2 + 1].to_string(),
        });
    }
    entries
}

/// Collapse whitespace runs to single spaces and trim the ends. Keeps every
/// field on one body line, which the pairing in `parse_body` depends on.
pub fn sanitize_line(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Snapshot filenames in `dir`, ascending. Fixed-width stamps make the
/// lexicographic order chronological.
pub fn list_pending(dir: &Path) -> Result<Vec<String>, ArchiveError> {
    let read_dir = fs::read_dir(dir).map_err(|source| ArchiveError::io(dir, source))?;
    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| ArchiveError::io(dir, source))?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(SNAPSHOT_SUFFIX) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Move a consumed snapshot into the archived area. Falls back to
/// copy-and-remove when a plain rename is refused; the target directory
/// must already exist.
pub fn retire(from: &Path, to: &Path) -> Result<(), ArchiveError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) =>
        {
            fs::copy(from, to).map_err(|source| ArchiveError::io(to, source))?;
            fs::remove_file(from).map_err(|source| ArchiveError::io(from, source))?;
            Ok(())
        }
        Err(source) => Err(ArchiveError::io(from, source)),
    }
}
