use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub const SCHEMA_VERSION: u32 = 1;

/// One parsed line of history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingField,
    InvalidTimestamp,
}

/// A non-blank history line that did not yield a `CommitRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub line: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorReport {
    pub author: String,
    #[serde(rename = "estimated_secs", serialize_with = "serialize_secs")]
    pub estimated: Duration,
    pub estimated_display: String,
    pub commit_count: usize,
    pub session_count: usize,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

/// Result of a successful analysis run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub authors: Vec<AuthorReport>,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub session_threshold_secs: i64,
    pub base_commit_time_secs: i64,
    pub skipped_lines: usize,
    pub authors: Vec<AuthorReport>,
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.num_seconds())
}
