use crate::error::GhoursError;
use crate::estimate::EstimatorConfig;
use crate::git::GitLogProvider;
use crate::history::{FileHistory, HistoryProvider};
use crate::model::DateRange;
use crate::report::{self, SortOrder};
use crate::util::{parse_date_bound, parse_duration};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghours")]
#[command(about = "Estimate time spent per author from git commit timestamps")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Read `author|date` lines from a file ('-' for stdin) instead of running git"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        env = "GHOURS_SESSION_THRESHOLD",
        default_value = "3h",
        help = "Largest gap between commits counted as one session"
    )]
    pub session_threshold: String,

    #[arg(
        long,
        env = "GHOURS_BASE_COMMIT_TIME",
        default_value = "30m",
        help = "Time credited for an isolated commit or a session start"
    )]
    pub base_commit_time: String,

    #[arg(long, help = "Only count commits from this date (RFC3339, YYYY-MM-DD, or 'N days ago')")]
    pub since: Option<String>,

    #[arg(long, help = "Only count commits up to this date (RFC3339, YYYY-MM-DD, or 'N days ago')")]
    pub until: Option<String>,

    #[arg(long, help = "Read only the current branch instead of all refs", default_value_t = false)]
    pub head_only: bool,

    #[arg(long, help = "Exclude merge commits", default_value_t = false)]
    pub no_merges: bool,

    #[arg(long, value_enum, default_value_t = SortOrder::History, help = "Row order")]
    pub sort: SortOrder,

    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,

    #[arg(short, long, help = "Enable debug logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn estimator_config(&self) -> crate::error::Result<EstimatorConfig> {
        Ok(EstimatorConfig {
            session_threshold: parse_duration(&self.session_threshold)?,
            base_commit_time: parse_duration(&self.base_commit_time)?,
        })
    }

    pub fn date_range(&self) -> crate::error::Result<DateRange> {
        let now = Utc::now();
        let mut range = DateRange::new();

        let since = self.since.as_deref().map(|s| parse_date_bound(s, now)).transpose()?;
        let until = self.until.as_deref().map(|u| parse_date_bound(u, now)).transpose()?;

        if let (Some(s), Some(u)) = (since, until) {
            if s > u {
                return Err(GhoursError::InvalidRange {
                    since: s.to_rfc3339(),
                    until: u.to_rfc3339(),
                });
            }
        }

        if let Some(s) = since {
            range = range.with_since(s);
        }
        if let Some(u) = until {
            range = range.with_until(u);
        }
        Ok(range)
    }

    pub fn provider(&self) -> Box<dyn HistoryProvider> {
        match &self.log_file {
            Some(path) => Box::new(FileHistory::new(path)),
            None => Box::new(
                GitLogProvider::new(self.repo.as_ref())
                    .all_refs(!self.head_only)
                    .include_merges(!self.no_merges),
            ),
        }
    }

    pub fn execute(self) -> Result<()> {
        let config = self.estimator_config().context("Invalid estimator configuration")?;
        let range = self.date_range().context("Failed to resolve date range")?;
        let provider = self.provider();

        let mut analysis = report::analyze(provider.as_ref(), &config, &range)?;
        report::sort_reports(&mut analysis.authors, self.sort);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if self.json {
            report::write_json(
                &mut out,
                &analysis,
                &config,
                provider.describe(),
                self.since.clone(),
                self.until.clone(),
            )?;
        } else if self.ndjson {
            report::write_ndjson(&mut out, &analysis.authors)?;
        } else {
            report::write_table(&mut out, &analysis.authors)?;
        }
        out.flush()?;

        Ok(())
    }
}
