//! Directory client — the single point of entry for all GitHub API calls.
//!
//! Search failures are hard errors (there is nothing to fetch without a
//! result page); per-account detail and repository failures are reported to
//! the caller, which decides whether to drop the account.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::candidate::RepoSummary;

pub mod fetcher;

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
// GitHub rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("scout-api/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory API error (status {status}): {body}")]
    Status { status: u16, body: String },
}

/// A search hit: just enough to drive the per-account detail fetches.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<UserRef>,
}

/// Detail payload for one account. Every field is optional: a sparse
/// profile is still a usable candidate.
#[derive(Debug, Default, Deserialize)]
pub struct UserDetail {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub html_url: Option<String>,
    pub avatar_url: Option<String>,
    pub followers: Option<i32>,
    pub public_repos: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    html_url: String,
    #[serde(default)]
    stargazers_count: i64,
    #[serde(default)]
    topics: Vec<String>,
    description: Option<String>,
}

/// Client for the developer-profile directory. Constructed once at startup
/// and injected through `AppState`.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, token })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", GITHUB_ACCEPT)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Searches accounts matching `query`. `per_page` must already be
    /// capped at the API maximum (see `fetcher::search_page_size`).
    pub async fn search_users(
        &self,
        query: &str,
        per_page: usize,
    ) -> Result<Vec<UserRef>, DirectoryError> {
        debug!("directory search: q={query} per_page={per_page}");
        let response = self
            .get(&format!("{GITHUB_API_URL}/search/users"))
            .query(&[("q", query), ("per_page", &per_page.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json::<SearchResponse>().await?.items)
    }

    /// Fetches profile detail for one account. Non-2xx is an error here;
    /// the fetcher drops the account rather than aborting the batch.
    pub async fn user_details(&self, username: &str) -> Result<UserDetail, DirectoryError> {
        let response = self
            .get(&format!("{GITHUB_API_URL}/users/{username}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json::<UserDetail>().await?)
    }

    /// Fetches up to `limit` repositories, most recently updated first.
    /// A non-2xx response degrades to an empty list; only transport errors
    /// propagate (and cost the account its place in the batch).
    pub async fn user_repos(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<RepoSummary>, DirectoryError> {
        let response = self
            .get(&format!("{GITHUB_API_URL}/users/{username}/repos"))
            .query(&[("sort", "updated"), ("per_page", &limit.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(
                "repository listing for {username} returned {}, using empty list",
                response.status()
            );
            return Ok(Vec::new());
        }

        let repos: Vec<RepoPayload> = response.json().await?;
        Ok(repos
            .into_iter()
            .map(|repo| RepoSummary {
                name: repo.name,
                url: repo.html_url,
                stars: repo.stargazers_count,
                topics: repo.topics,
                description: repo.description,
            })
            .collect())
    }
}
