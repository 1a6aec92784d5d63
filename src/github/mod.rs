pub mod pagination;
pub mod types;

pub use pagination::PageSet;
pub use types::{PullRequestDetail, PullRequestSummary, Repository};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid GitHub token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Unexpected GitHub response: {0}")]
    UnexpectedResponse(String),
}

/// The read operations the metrics aggregator consumes. Implemented over
/// HTTP by [`GithubClient`] and by in-memory fakes in tests.
///
/// Query parameters are opaque pass-through: the source forwards them to the
/// endpoint without interpreting them.
#[async_trait]
pub trait PullRequestSource {
    /// List a repository's pull requests, paginated to completion.
    async fn list_pulls(
        &self,
        repo: &str,
        params: &[(&str, &str)],
    ) -> Result<PageSet<Vec<PullRequestSummary>>, GithubError>;

    /// Fetch one pull request's full detail record.
    async fn get_pull(
        &self,
        repo: &str,
        number: u64,
        params: &[(&str, &str)],
    ) -> Result<PageSet<PullRequestDetail>, GithubError>;
}

/// Authenticated GitHub REST client scoped to one organization.
///
/// One underlying session (and its connection pool) is reused for every call
/// in a run. Auth headers are fixed at construction; the paginator issues
/// follow-up requests through the same session.
pub struct GithubClient {
    client: reqwest::Client,
    base_url: String,
    org: String,
}

impl GithubClient {
    pub fn new(token: &str, org: &str) -> Result<Self, GithubError> {
        Self::with_base_url(token, org, DEFAULT_BASE_URL)
    }

    /// The base URL override is how HTTP-level tests point the client at a
    /// mock server.
    pub fn with_base_url(token: &str, org: &str, base_url: &str) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-metrics"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            org: org.to_string(),
        })
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<PageSet<T>, GithubError> {
        let response = self.client.get(url).query(params).send().await?;
        pagination::paginate(&self.client, response).await
    }

    /// List all repositories of the organization, flattened to their names
    /// in page order then within-page order. Duplicates across pages are not
    /// removed.
    #[instrument(skip(self, params), fields(org = %self.org))]
    pub async fn list_repo_names(&self, params: &[(&str, &str)]) -> Result<Vec<String>, GithubError> {
        let url = format!("{}/orgs/{}/repos", self.base_url, self.org);
        let set: PageSet<Vec<Repository>> = self.get_paginated(&url, params).await?;
        debug!(pages = set.page_count, repos = set.record_count(), "fetched repository list");
        Ok(set.into_records().into_iter().map(|repo| repo.name).collect())
    }
}

#[async_trait]
impl PullRequestSource for GithubClient {
    #[instrument(skip(self, params), fields(org = %self.org))]
    async fn list_pulls(
        &self,
        repo: &str,
        params: &[(&str, &str)],
    ) -> Result<PageSet<Vec<PullRequestSummary>>, GithubError> {
        let url = format!("{}/repos/{}/{}/pulls", self.base_url, self.org, repo);
        let set = self.get_paginated(&url, params).await?;
        debug!(pages = set.page_count, "fetched pull request list");
        Ok(set)
    }

    #[instrument(skip(self, params), fields(org = %self.org))]
    async fn get_pull(
        &self,
        repo: &str,
        number: u64,
        params: &[(&str, &str)],
    ) -> Result<PageSet<PullRequestDetail>, GithubError> {
        let url = format!("{}/repos/{}/{}/pulls/{}", self.base_url, self.org, repo, number);
        self.get_paginated(&url, params).await
    }
}
