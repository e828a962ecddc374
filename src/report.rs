use crate::error::Result;
use crate::estimate::EstimatorConfig;
use crate::history::{parse_history, AuthorHistory, HistoryProvider};
use crate::model::{AuthorReport, DateRange, Report, ReportOutput, SCHEMA_VERSION};
use chrono::Utc;
use clap::ValueEnum;
use console::style;
use std::io::Write;
use tracing::{debug, warn};

pub const SEPARATOR_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Order in which authors first appear in the history
    #[default]
    History,
    Name,
    /// Largest estimate first
    Time,
    /// Most commits first
    Commits,
}

/// Fetch, parse, filter and estimate. Skipped lines are reported, not fatal.
pub fn analyze<P: HistoryProvider + ?Sized>(
    provider: &P,
    config: &EstimatorConfig,
    range: &DateRange,
) -> Result<Report> {
    let text = provider.fetch()?;
    let mut parsed = parse_history(&text);

    if !parsed.skipped.is_empty() {
        warn!(count = parsed.skipped.len(), "skipped malformed history lines");
    }

    parsed.authors.retain_range(range);
    Ok(Report {
        authors: estimate_authors(parsed.authors, config)?,
        skipped: parsed.skipped,
    })
}

pub fn estimate_authors(
    history: AuthorHistory,
    config: &EstimatorConfig,
) -> Result<Vec<AuthorReport>> {
    let mut reports = Vec::with_capacity(history.len());
    for (author, times) in history.into_sorted() {
        if let Some(report) = config.author_report(author, &times)? {
            debug!(
                author = %report.author,
                commits = report.commit_count,
                sessions = report.session_count,
                estimated = %report.estimated_display,
                "estimated author"
            );
            reports.push(report);
        }
    }
    Ok(reports)
}

pub fn sort_reports(reports: &mut [AuthorReport], order: SortOrder) {
    match order {
        SortOrder::History => {}
        SortOrder::Name => reports.sort_by(|a, b| a.author.cmp(&b.author)),
        SortOrder::Time => reports.sort_by(|a, b| b.estimated.cmp(&a.estimated)),
        SortOrder::Commits => reports.sort_by(|a, b| b.commit_count.cmp(&a.commit_count)),
    }
}

pub fn write_table<W: Write>(out: &mut W, reports: &[AuthorReport]) -> Result<()> {
    writeln!(
        out,
        "{:<25} | {:<20} | {:<10}",
        style("AUTHOR").bold(),
        style("ESTIMATED TIME").bold(),
        style("COMMITS").bold()
    )?;
    writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    for r in reports {
        writeln!(
            out,
            "{:<25} | {:<20} | {:<10}",
            r.author, r.estimated_display, r.commit_count
        )?;
    }
    if reports.is_empty() {
        warn!("no commits found");
    }
    Ok(())
}

pub fn write_json<W: Write>(
    out: &mut W,
    report: &Report,
    config: &EstimatorConfig,
    repository_path: String,
    since: Option<String>,
    until: Option<String>,
) -> Result<()> {
    let output = ReportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path,
        since,
        until,
        session_threshold_secs: config.session_threshold.num_seconds(),
        base_commit_time_secs: config.base_commit_time.num_seconds(),
        skipped_lines: report.skipped.len(),
        authors: report.authors.clone(),
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

pub fn write_ndjson<W: Write>(out: &mut W, reports: &[AuthorReport]) -> Result<()> {
    for r in reports {
        writeln!(out, "{}", serde_json::to_string(r)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GhoursError;
    use crate::history::StaticHistory;
    use crate::model::SkipReason;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    struct FailingHistory;

    impl HistoryProvider for FailingHistory {
        fn fetch(&self) -> Result<String> {
            Err(GhoursError::source_unavailable("exit status: 128"))
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    const LOG: &str = "\
A|2023-01-01 10:10:00 +0000
B|2023-01-01 09:00:00 +0000
A|2023-01-01 10:00:00 +0000
only-one-field
A|definitely not a date
A|2023-01-01 09:00:00 +0000
";

    fn run(log: &str) -> Report {
        analyze(&StaticHistory::new(log), &EstimatorConfig::default(), &DateRange::new()).unwrap()
    }

    fn render(reports: &[AuthorReport]) -> String {
        let mut buf = Vec::new();
        write_table(&mut buf, reports).unwrap();
        console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string()
    }

    #[test]
    fn analyze_groups_and_estimates() {
        let report = run(LOG);

        let summary: Vec<_> = report
            .authors
            .iter()
            .map(|r| (r.author.as_str(), r.estimated_display.as_str(), r.commit_count))
            .collect();
        assert_eq!(summary, vec![("A", "1h 40m", 3), ("B", "0h 30m", 1)]);

        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::MissingField, SkipReason::InvalidTimestamp]);
    }

    #[test]
    fn analyze_propagates_source_failure() {
        let err = analyze(&FailingHistory, &EstimatorConfig::default(), &DateRange::new())
            .unwrap_err();
        assert!(matches!(err, GhoursError::SourceUnavailable { .. }));
    }

    #[test]
    fn analyze_applies_date_range() {
        let since = Utc.with_ymd_and_hms(2023, 1, 1, 9, 30, 0).unwrap();
        let report = analyze(
            &StaticHistory::new(LOG),
            &EstimatorConfig::default(),
            &DateRange::new().with_since(since),
        )
        .unwrap();

        assert_eq!(report.authors.len(), 1);
        assert_eq!(report.authors[0].author, "A");
        assert_eq!(report.authors[0].estimated, Duration::minutes(40));
    }

    #[test]
    fn table_layout_is_author_time_commits() {
        let out = render(&run(LOG).authors);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            format!("{:<25} | {:<20} | {:<10}", "AUTHOR", "ESTIMATED TIME", "COMMITS")
        );
        assert_eq!(lines[1], "-".repeat(60));
        assert_eq!(lines[2], format!("{:<25} | {:<20} | {:<10}", "A", "1h 40m", 3));
        assert_eq!(lines[3], format!("{:<25} | {:<20} | {:<10}", "B", "0h 30m", 1));
    }

    #[test]
    fn empty_history_still_prints_header_and_separator() {
        let out = render(&run("").authors);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("AUTHOR"));
        assert_eq!(lines[1], "-".repeat(60));
    }

    #[test]
    fn overflowing_estimate_is_an_error() {
        let config = EstimatorConfig {
            base_commit_time: crate::util::parse_duration("200000000years").unwrap(),
            ..EstimatorConfig::default()
        };
        let log = "A|2023-01-01 10:00:00 +0000\nA|2023-01-02 10:00:00 +0000\n";
        let err = analyze(&StaticHistory::new(log), &config, &DateRange::new()).unwrap_err();
        assert!(matches!(err, GhoursError::DurationOverflow(_)));
    }

    #[test]
    fn sorting_options() {
        let mut reports = run(LOG).authors;

        sort_reports(&mut reports, SortOrder::Name);
        assert_eq!(reports[0].author, "A");

        sort_reports(&mut reports, SortOrder::Commits);
        assert_eq!(reports[0].author, "A");

        let log = "\
z|2023-01-01 10:00:00 +0000
y|2023-01-01 10:00:00 +0000
y|2023-01-01 11:00:00 +0000
";
        let mut reports = run(log).authors;
        sort_reports(&mut reports, SortOrder::History);
        assert_eq!(reports[0].author, "z");
        sort_reports(&mut reports, SortOrder::Time);
        assert_eq!(reports[0].author, "y");
        sort_reports(&mut reports, SortOrder::Name);
        assert_eq!(reports[0].author, "y");
    }

    #[test]
    fn json_envelope_carries_config_and_skips() {
        let report = run(LOG);
        let mut buf = Vec::new();
        let config = EstimatorConfig::default();
        write_json(&mut buf, &report, &config, "repo".into(), None, None).unwrap();

        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["version"], SCHEMA_VERSION);
        assert_eq!(v["session_threshold_secs"], 3 * 3600);
        assert_eq!(v["base_commit_time_secs"], 30 * 60);
        assert_eq!(v["skipped_lines"], 2);
        assert_eq!(v["authors"][0]["estimated_secs"], 6000);
    }

    #[test]
    fn ndjson_is_one_author_per_line() {
        let report = run(LOG);
        let mut buf = Vec::new();
        write_ndjson(&mut buf, &report.authors).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let authors: Vec<String> = text
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                v["author"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(authors, vec!["A", "B"]);
    }
}
