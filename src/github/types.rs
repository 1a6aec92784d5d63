use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One entry from the org repositories list endpoint. Only the name is
/// needed downstream; everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

/// A pull request as returned by the list endpoint.
///
/// `created_at` is required — a record without it fails deserialization of
/// the whole page rather than surfacing later as a missing value.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSummary {
    /// PR number, unique within its repository
    pub number: u64,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// "open" or "closed"; merged PRs also report "closed"
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// A pull request as returned by the single-item endpoint; superset of the
/// list record carrying the size and review-activity counters.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestDetail {
    pub number: u64,
    pub state: String,
    pub user: User,
    pub comments: u64,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_deserializes_nullable_terminals() {
        let json = r#"{
            "number": 7,
            "created_at": "2024-01-01T00:00:00Z",
            "merged_at": null,
            "closed_at": "2024-01-10T12:30:00Z",
            "state": "closed"
        }"#;
        let pr: PullRequestSummary = serde_json::from_str(json).unwrap();
        assert_eq!(pr.number, 7);
        assert!(pr.merged_at.is_none());
        assert!(pr.closed_at.is_some());
        assert_eq!(pr.state, "closed");
    }

    #[test]
    fn test_summary_requires_created_at() {
        let json = r#"{"number": 7, "merged_at": null, "closed_at": null, "state": "open"}"#;
        assert!(serde_json::from_str::<PullRequestSummary>(json).is_err());
    }

    #[test]
    fn test_detail_reads_nested_user_login() {
        let json = r#"{
            "number": 42,
            "state": "closed",
            "user": {"login": "alice"},
            "comments": 3,
            "commits": 2,
            "additions": 10,
            "deletions": 5,
            "changed_files": 1
        }"#;
        let pr: PullRequestDetail = serde_json::from_str(json).unwrap();
        assert_eq!(pr.user.login, "alice");
        assert_eq!(pr.changed_files, 1);
    }
}
