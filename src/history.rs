//! History sources and the line parser that turns raw history into
//! per-author timestamp lists.

use crate::error::Result;
use crate::model::{CommitRecord, DateRange, SkipReason, SkippedLine};
use crate::util::parse_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

pub const FIELD_DELIMITER: char = '|';

/// Anything that can produce raw `author|date` history text.
pub trait HistoryProvider {
    fn fetch(&self) -> Result<String>;

    /// Human-readable origin, used in reports.
    fn describe(&self) -> String;
}

/// Fixed in-memory history.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    text: String,
}

impl StaticHistory {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl HistoryProvider for StaticHistory {
    fn fetch(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

/// A pre-captured log on disk, or stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }
}

impl HistoryProvider for FileHistory {
    fn fetch(&self) -> Result<String> {
        if self.is_stdin() {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            return Ok(text);
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        if self.is_stdin() {
            "<stdin>".to_string()
        } else {
            self.path.to_string_lossy().to_string()
        }
    }
}

/// Timestamps grouped by author, keeping the order authors first appear.
#[derive(Debug, Clone, Default)]
pub struct AuthorHistory {
    order: Vec<String>,
    commits: HashMap<String, Vec<DateTime<Utc>>>,
}

impl AuthorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CommitRecord) {
        match self.commits.get_mut(&record.author) {
            Some(times) => times.push(record.timestamp),
            None => {
                self.order.push(record.author.clone());
                self.commits.insert(record.author, vec![record.timestamp]);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.values().map(Vec::len).sum()
    }

    pub fn timestamps(&self, author: &str) -> Option<&[DateTime<Utc>]> {
        self.commits.get(author).map(Vec::as_slice)
    }

    /// Drop timestamps outside `range`; authors left with none are removed.
    pub fn retain_range(&mut self, range: &DateRange) {
        if range.is_unbounded() {
            return;
        }
        for times in self.commits.values_mut() {
            times.retain(|t| range.contains(t));
        }
        let commits = &self.commits;
        self.order.retain(|a| commits.get(a).is_some_and(|t| !t.is_empty()));
        self.commits.retain(|_, t| !t.is_empty());
    }

    /// Consume into `(author, sorted timestamps)` pairs in first-seen order.
    pub fn into_sorted(mut self) -> Vec<(String, Vec<DateTime<Utc>>)> {
        self.order
            .into_iter()
            .filter_map(|author| {
                let mut times = self.commits.remove(&author)?;
                times.sort();
                Some((author, times))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedHistory {
    pub authors: AuthorHistory,
    pub skipped: Vec<SkippedLine>,
}

/// Parse a single history line.
pub fn parse_line(line: &str) -> std::result::Result<CommitRecord, SkipReason> {
    let mut fields = line.split(FIELD_DELIMITER);
    let (Some(author), Some(date)) = (fields.next(), fields.next()) else {
        return Err(SkipReason::MissingField);
    };
    let timestamp = parse_timestamp(date).ok_or(SkipReason::InvalidTimestamp)?;
    Ok(CommitRecord { author: author.trim().to_string(), timestamp })
}

/// Parse raw history text. Malformed lines are collected, never fatal.
pub fn parse_history(text: &str) -> ParsedHistory {
    let mut parsed = ParsedHistory::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(record) => parsed.authors.push(record),
            Err(reason) => {
                debug!(line_number = idx + 1, ?reason, line, "skipping history line");
                parsed.skipped.push(SkippedLine {
                    line_number: idx + 1,
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    parsed
}
