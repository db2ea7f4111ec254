//! Profile Fetcher — turns a job into a batch of candidate profiles.
//!
//! One directory search, then a bounded concurrent fan-out across the
//! matched accounts. Individual account failures drop that account; the
//! batch proceeds.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::github::{DirectoryError, GithubClient};
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobRow;

/// Directory API per-page maximum.
pub const SEARCH_PAGE_MAX: usize = 100;
/// Fixed worker cap for the per-account fan-out, so a large batch cannot
/// trip the directory's rate limits.
pub const FETCH_CONCURRENCY: usize = 8;
/// Repositories fetched per account, most recently updated first.
const REPO_PAGE_SIZE: usize = 30;
/// Follower floor appended to every search, biasing toward active accounts.
const FOLLOWER_FLOOR: &str = "followers:>10";
/// At most this many skills go into the search query; more makes the
/// directory search too narrow to return anything.
const MAX_QUERY_SKILLS: usize = 3;

/// Builds the directory search query from job criteria.
pub fn build_search_query(required_skills: &[String], location: Option<&str>) -> String {
    let mut parts: Vec<String> = required_skills
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .take(MAX_QUERY_SKILLS)
        .map(|skill| format!("language:{}", skill.trim()))
        .collect();

    if let Some(location) = location {
        // "Berlin, Germany" → "Berlin"; the directory matches on free text.
        let city = location.split(',').next().unwrap_or(location).trim();
        if !city.is_empty() {
            parts.push(format!("location:{city}"));
        }
    }

    parts.push(FOLLOWER_FLOOR.to_string());
    parts.join(" ")
}

/// Page size for the search call: the requested limit, capped at the API
/// maximum and floored at one.
pub fn search_page_size(limit: usize) -> usize {
    limit.clamp(1, SEARCH_PAGE_MAX)
}

/// Fetches up to `limit` candidate profiles for a job.
///
/// The returned sequence preserves directory result order, may be shorter
/// than `limit`, and is empty when every account fetch failed. Only the
/// initial search can fail the whole call.
pub async fn fetch_candidates(
    github: &GithubClient,
    job: &JobRow,
    limit: usize,
) -> Result<Vec<CandidateProfile>, DirectoryError> {
    let query = build_search_query(&job.required_skills, job.location.as_deref());
    let mut matches = github.search_users(&query, search_page_size(limit)).await?;
    matches.truncate(limit);
    info!(
        "directory search matched {} accounts for job {}",
        matches.len(),
        job.id
    );

    let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
    let mut tasks = JoinSet::new();
    for (position, account) in matches.into_iter().enumerate() {
        let github = github.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (position, fetch_account(&github, &account.login).await)
        });
    }

    let mut fetched: Vec<(usize, CandidateProfile)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, Some(profile))) => fetched.push((position, profile)),
            Ok((_, None)) => {} // already logged by fetch_account
            Err(e) => warn!("account fetch task failed: {e}"),
        }
    }

    // The fan-out completes out of order; restore directory result order so
    // downstream tie-breaking stays stable.
    fetched.sort_by_key(|(position, _)| *position);
    Ok(fetched.into_iter().map(|(_, profile)| profile).collect())
}

/// Fetches detail and repositories for one account concurrently.
/// Returns None (dropping the account) when the detail fetch or either
/// transport fails.
async fn fetch_account(github: &GithubClient, login: &str) -> Option<CandidateProfile> {
    let (detail, repos) = tokio::join!(
        github.user_details(login),
        github.user_repos(login, REPO_PAGE_SIZE)
    );

    let detail = match detail {
        Ok(detail) => detail,
        Err(e) => {
            warn!("dropping {login}: profile detail fetch failed: {e}");
            return None;
        }
    };
    let repositories = match repos {
        Ok(repositories) => repositories,
        Err(e) => {
            warn!("dropping {login}: repository fetch failed: {e}");
            return None;
        }
    };

    Some(CandidateProfile {
        username: login.to_string(),
        display_name: detail.name,
        email: detail.email,
        bio: detail.bio,
        company: detail.company,
        location: detail.location,
        profile_url: detail
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{login}")),
        avatar_url: detail.avatar_url,
        followers: detail.followers.unwrap_or(0),
        public_repos: detail.public_repos.unwrap_or(0),
        repositories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_query_includes_skills_location_and_follower_floor() {
        let query = build_search_query(&skills(&["Go", "Kubernetes"]), Some("Berlin"));
        assert_eq!(
            query,
            "language:Go language:Kubernetes location:Berlin followers:>10"
        );
    }

    #[test]
    fn test_query_caps_skills_at_three() {
        let query = build_search_query(&skills(&["Rust", "Go", "Python", "Java"]), None);
        assert_eq!(
            query,
            "language:Rust language:Go language:Python followers:>10"
        );
    }

    #[test]
    fn test_query_takes_first_location_segment() {
        let query = build_search_query(&skills(&["Rust"]), Some("Berlin, Germany"));
        assert_eq!(query, "language:Rust location:Berlin followers:>10");
    }

    #[test]
    fn test_query_skips_blank_skills_and_location() {
        let query = build_search_query(&skills(&["", "Rust"]), Some("  "));
        assert_eq!(query, "language:Rust followers:>10");
    }

    #[test]
    fn test_query_without_criteria_still_has_floor() {
        assert_eq!(build_search_query(&[], None), "followers:>10");
    }

    #[test]
    fn test_page_size_caps_at_api_maximum() {
        assert_eq!(search_page_size(250), SEARCH_PAGE_MAX);
        assert_eq!(search_page_size(50), 50);
        assert_eq!(search_page_size(0), 1);
    }
}
