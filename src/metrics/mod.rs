pub mod lifetime;
pub mod types;

pub use lifetime::{lifetime_days, PrOutcome};
pub use types::MetricRow;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, info};

use crate::github::{GithubError, PageSet, PullRequestSource, PullRequestSummary};

/// Fixed timestamp format of the CLI window flags.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Page size requested from every list endpoint.
pub const PER_PAGE: &str = "100";

/// Parse a timezone-naive `YYYY-MM-DDTHH:MM:SSZ` string, interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Creation-date window, inclusive at both ends.
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: parse_timestamp(start)?,
            end: parse_timestamp(end)?,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Walk every repository and accumulate one [`MetricRow`] per pull request
/// created inside the window.
///
/// Processing is strictly sequential: one repository at a time, one pull
/// request at a time, every network call completing before the next begins.
/// Rows accumulate in encounter order (repository iteration outer, PR-list
/// order inner). A failure anywhere aborts the whole run.
///
/// `now` is the instant open pull requests measure their lifetime against;
/// callers pass `Utc::now()` so one run uses a single consistent value.
pub async fn collect_metrics<S: PullRequestSource>(
    source: &S,
    repos: &[String],
    excluded: &[String],
    target_branch: &str,
    window: DateWindow,
    now: DateTime<Utc>,
) -> Result<Vec<MetricRow>, GithubError> {
    let mut rows = Vec::new();

    for repo in repos {
        if excluded.iter().any(|name| name == repo) {
            info!(repo = %repo, "repository excluded, skipping");
            continue;
        }

        info!(repo = %repo, "processing repository");
        let params = [
            ("state", "all"),
            ("per_page", PER_PAGE),
            ("base", target_branch),
        ];
        let pulls = source.list_pulls(repo, &params).await?;
        debug!(repo = %repo, pages = pulls.page_count, pulls = pulls.record_count(), "fetched pull request list");

        process_pulls(source, repo, &pulls, window, now, &mut rows).await?;
    }

    Ok(rows)
}

/// Filter one repository's pull requests by the window and append a row for
/// each qualifying one. The detail record is fetched only after a pull
/// request passes the filter, to bound API cost.
async fn process_pulls<S: PullRequestSource>(
    source: &S,
    repo: &str,
    pulls: &PageSet<Vec<PullRequestSummary>>,
    window: DateWindow,
    now: DateTime<Utc>,
    rows: &mut Vec<MetricRow>,
) -> Result<(), GithubError> {
    for page in &pulls.pages {
        for pr in page {
            if !window.contains(pr.created_at) {
                continue;
            }

            let detail = source
                .get_pull(repo, pr.number, &[("per_page", PER_PAGE)])
                .await?
                .into_first()
                .ok_or_else(|| {
                    GithubError::UnexpectedResponse(format!(
                        "empty page set for pull request {}/{}",
                        repo, pr.number
                    ))
                })?;

            let outcome = PrOutcome::classify(pr.merged_at, pr.closed_at);
            let lifetime = lifetime_days(pr.created_at, outcome, now);
            debug!(repo = %repo, pr = pr.number, lifetime, "collected pull request");

            rows.push(MetricRow {
                repo: repo.to_string(),
                engineer: detail.user.login,
                pr_number: pr.number,
                created_at: pr.created_at.format("%Y-%m-%d").to_string(),
                pr_state: detail.state,
                pr_lifetime_days: lifetime,
                commits: detail.commits,
                comments: detail.comments,
                additions: detail.additions,
                deletions: detail.deletions,
                changed_files: detail.changed_files,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::{PullRequestDetail, User};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn ts(value: &str) -> DateTime<Utc> {
        parse_timestamp(value).unwrap()
    }

    fn summary(number: u64, created: &str, merged: Option<&str>, closed: Option<&str>) -> PullRequestSummary {
        PullRequestSummary {
            number,
            created_at: ts(created),
            merged_at: merged.map(ts),
            closed_at: closed.map(ts),
            state: if closed.is_some() || merged.is_some() { "closed" } else { "open" }.to_string(),
        }
    }

    fn detail(number: u64, login: &str, state: &str) -> PullRequestDetail {
        PullRequestDetail {
            number,
            state: state.to_string(),
            user: User {
                login: login.to_string(),
            },
            comments: 3,
            commits: 2,
            additions: 10,
            deletions: 5,
            changed_files: 1,
        }
    }

    /// In-memory source that records every detail fetch, so tests can assert
    /// lazy fetching.
    struct FakeSource {
        pulls: HashMap<String, Vec<Vec<PullRequestSummary>>>,
        details: HashMap<(String, u64), PullRequestDetail>,
        detail_calls: Mutex<Vec<(String, u64)>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                pulls: HashMap::new(),
                details: HashMap::new(),
                detail_calls: Mutex::new(Vec::new()),
            }
        }

        fn with_repo(mut self, repo: &str, pulls: Vec<PullRequestSummary>, details: Vec<PullRequestDetail>) -> Self {
            for d in details {
                self.details.insert((repo.to_string(), d.number), d);
            }
            self.pulls.insert(repo.to_string(), vec![pulls]);
            self
        }

        fn detail_calls(&self) -> Vec<(String, u64)> {
            self.detail_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PullRequestSource for FakeSource {
        async fn list_pulls(
            &self,
            repo: &str,
            _params: &[(&str, &str)],
        ) -> Result<PageSet<Vec<PullRequestSummary>>, GithubError> {
            let pages = self.pulls.get(repo).cloned().unwrap_or_default();
            Ok(PageSet {
                page_count: pages.len().max(1),
                pages: if pages.is_empty() { vec![Vec::new()] } else { pages },
            })
        }

        async fn get_pull(
            &self,
            repo: &str,
            number: u64,
            _params: &[(&str, &str)],
        ) -> Result<PageSet<PullRequestDetail>, GithubError> {
            self.detail_calls
                .lock()
                .unwrap()
                .push((repo.to_string(), number));
            let detail = self
                .details
                .get(&(repo.to_string(), number))
                .cloned()
                .expect("test requested a detail record that was not seeded");
            Ok(PageSet {
                page_count: 1,
                pages: vec![detail],
            })
        }
    }

    fn window() -> DateWindow {
        DateWindow::parse("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z").unwrap()
    }

    #[test]
    fn test_parse_timestamp_fixed_format() {
        let parsed = parse_timestamp("2024-01-05T12:30:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 5, 12, 30, 0).unwrap());
        assert!(parse_timestamp("2024-01-05").is_err());
    }

    #[test]
    fn test_window_inclusive_at_both_ends() {
        let w = window();
        assert!(w.contains(ts("2024-01-01T00:00:00Z")));
        assert!(w.contains(ts("2024-01-31T23:59:59Z")));
        assert!(!w.contains(ts("2023-12-31T23:59:59Z")));
        assert!(!w.contains(ts("2024-02-01T00:00:00Z")));
    }

    #[tokio::test]
    async fn test_detail_fetched_only_for_qualifying_pulls() {
        let source = FakeSource::new().with_repo(
            "numbers",
            vec![
                summary(1, "2023-11-15T10:00:00Z", None, Some("2023-11-20T10:00:00Z")),
                summary(2, "2024-01-10T10:00:00Z", Some("2024-01-12T10:00:00Z"), Some("2024-01-12T10:00:00Z")),
                summary(3, "2024-03-01T10:00:00Z", None, None),
            ],
            vec![detail(2, "alice", "closed")],
        );

        let repos = vec!["numbers".to_string()];
        let rows = collect_metrics(&source, &repos, &[], "main", window(), ts("2024-06-01T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pr_number, 2);
        assert_eq!(source.detail_calls(), vec![("numbers".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_excluded_repo_contributes_no_rows() {
        let source = FakeSource::new()
            .with_repo(
                "kept",
                vec![summary(1, "2024-01-05T00:00:00Z", Some("2024-01-09T00:00:00Z"), Some("2024-01-09T00:00:00Z"))],
                vec![detail(1, "alice", "closed")],
            )
            .with_repo(
                "skipped",
                vec![summary(9, "2024-01-05T00:00:00Z", None, None)],
                vec![detail(9, "bob", "open")],
            );

        let repos = vec!["kept".to_string(), "skipped".to_string()];
        let excluded = vec!["skipped".to_string()];
        let rows = collect_metrics(&source, &repos, &excluded, "main", window(), ts("2024-06-01T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].repo, "kept");
        assert!(source.detail_calls().iter().all(|(repo, _)| repo == "kept"));
    }

    #[tokio::test]
    async fn test_row_field_mapping() {
        let source = FakeSource::new().with_repo(
            "numbers",
            vec![summary(42, "2024-01-01T00:00:00Z", Some("2024-01-05T00:00:00Z"), Some("2024-01-05T00:00:00Z"))],
            vec![detail(42, "alice", "closed")],
        );

        let repos = vec!["numbers".to_string()];
        let rows = collect_metrics(&source, &repos, &[], "main", window(), ts("2024-06-01T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(
            rows[0],
            MetricRow {
                repo: "numbers".to_string(),
                engineer: "alice".to_string(),
                pr_number: 42,
                created_at: "2024-01-01".to_string(),
                pr_state: "closed".to_string(),
                pr_lifetime_days: 4,
                commits: 2,
                comments: 3,
                additions: 10,
                deletions: 5,
                changed_files: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_rows_in_encounter_order_across_repos() {
        let source = FakeSource::new()
            .with_repo(
                "alpha",
                vec![
                    summary(5, "2024-01-03T00:00:00Z", None, None),
                    summary(6, "2024-01-04T00:00:00Z", None, None),
                ],
                vec![detail(5, "alice", "open"), detail(6, "bob", "open")],
            )
            .with_repo(
                "beta",
                vec![summary(1, "2024-01-02T00:00:00Z", None, None)],
                vec![detail(1, "carol", "open")],
            );

        let repos = vec!["alpha".to_string(), "beta".to_string()];
        let rows = collect_metrics(&source, &repos, &[], "main", window(), ts("2024-02-01T00:00:00Z"))
            .await
            .unwrap();

        let order: Vec<(&str, u64)> = rows.iter().map(|r| (r.repo.as_str(), r.pr_number)).collect();
        assert_eq!(order, vec![("alpha", 5), ("alpha", 6), ("beta", 1)]);
    }
}
