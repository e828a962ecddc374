//! Session-based time estimation.
//!
//! Consecutive commits closer together than the session threshold are
//! treated as continuous work and their gap is credited in full. A larger
//! gap starts a new session, which is credited with the base commit time
//! instead of the idle gap.

use crate::error::{GhoursError, Result};
use crate::model::AuthorReport;
use crate::util::format_hm;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_SESSION_THRESHOLD_MINS: i64 = 180;
pub const DEFAULT_BASE_COMMIT_TIME_MINS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorConfig {
    /// Largest gap between commits still counted as the same session.
    pub session_threshold: Duration,
    /// Credit for an isolated commit or the first commit of a session.
    pub base_commit_time: Duration,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            session_threshold: Duration::minutes(DEFAULT_SESSION_THRESHOLD_MINS),
            base_commit_time: Duration::minutes(DEFAULT_BASE_COMMIT_TIME_MINS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub total: Duration,
    pub commit_count: usize,
    pub session_count: usize,
}

impl EstimatorConfig {
    /// Estimate time spent for one author. `timestamps` must be sorted.
    ///
    /// Returns `None` for an empty slice, or if the total does not fit in a
    /// `Duration`.
    pub fn estimate(&self, timestamps: &[DateTime<Utc>]) -> Option<Estimate> {
        let (first, rest) = timestamps.split_first()?;

        let mut total = self.base_commit_time;
        let mut sessions = 1;
        let mut last = first;

        for current in rest {
            let diff = *current - *last;
            let credit = if diff < self.session_threshold {
                diff
            } else {
                sessions += 1;
                self.base_commit_time
            };
            total = total.checked_add(&credit)?;
            last = current;
        }

        Some(Estimate {
            total,
            commit_count: timestamps.len(),
            session_count: sessions,
        })
    }

    /// Build the report row for `author`; `Ok(None)` when there are no commits.
    pub fn author_report(
        &self,
        author: String,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Option<AuthorReport>> {
        let (Some(first_commit), Some(last_commit)) = (timestamps.first(), timestamps.last())
        else {
            return Ok(None);
        };
        let estimate = self
            .estimate(timestamps)
            .ok_or_else(|| GhoursError::DurationOverflow(author.clone()))?;

        Ok(Some(AuthorReport {
            author,
            estimated: estimate.total,
            estimated_display: format_hm(estimate.total),
            commit_count: estimate.commit_count,
            session_count: estimate.session_count,
            first_commit: *first_commit,
            last_commit: *last_commit,
        }))
    }
}
