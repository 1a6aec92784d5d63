use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::GithubError;

/// Result of following a paginated resource to completion.
///
/// Pages are kept in link-traversal order, never reordered or deduplicated;
/// callers that need a flat sequence flatten it themselves.
#[derive(Debug, Clone)]
pub struct PageSet<T> {
    pub page_count: usize,
    pub pages: Vec<T>,
}

impl<T> PageSet<T> {
    /// First page payload. The paginator never builds an empty set, so this
    /// is only `None` for a hand-constructed `PageSet`.
    pub fn into_first(self) -> Option<T> {
        self.pages.into_iter().next()
    }
}

impl<T> PageSet<Vec<T>> {
    /// Flatten all pages into one sequence: page order, then within-page
    /// order.
    pub fn into_records(self) -> Vec<T> {
        self.pages.into_iter().flatten().collect()
    }

    /// Total records across all pages.
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(|page| page.len()).sum()
    }
}

/// Follow the `rel="next"` chain starting from an already-issued response.
///
/// The first page's method, headers, and query parameters were chosen by the
/// caller; follow-up pages are plain GETs to the link URL verbatim, which
/// already encodes the query. Any non-2xx status or malformed body aborts
/// the whole operation — partially fetched pages are discarded.
pub(crate) async fn paginate<T: DeserializeOwned>(
    client: &reqwest::Client,
    first: reqwest::Response,
) -> Result<PageSet<T>, GithubError> {
    let response = first.error_for_status()?;
    let mut next = next_link(response.headers());
    let mut pages = vec![response.json::<T>().await?];

    while let Some(url) = next {
        debug!(url = %url, "following pagination link");
        let response = client.get(&url).send().await?.error_for_status()?;
        next = next_link(response.headers());
        pages.push(response.json::<T>().await?);
    }

    Ok(PageSet {
        page_count: pages.len(),
        pages,
    })
}

/// Extract the `rel="next"` target from an RFC-5988 Link header, e.g.
/// `<https://api.github.com/...?page=2>; rel="next", <...>; rel="last"`.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(LINK)?.to_str().ok()?;
    for entry in raw.split(',') {
        let mut parts = entry.split(';');
        let target = parts.next().unwrap_or("").trim();
        if parts.any(|param| param.trim() == "rel=\"next\"") {
            let url = target.strip_prefix('<')?.strip_suffix('>')?;
            return Some(url.to_string());
        }
    }
    None
}
