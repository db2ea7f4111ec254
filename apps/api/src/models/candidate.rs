use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One public repository attached to a fetched profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub url: String,
    pub stars: i64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub description: Option<String>,
}

/// A developer profile as fetched from the directory, before any scoring.
/// Read-only once the fetch phase has persisted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub profile_url: String,
    pub avatar_url: Option<String>,
    pub followers: i32,
    pub public_repos: i32,
    pub repositories: Vec<RepoSummary>,
}

/// Persisted candidate row: profile fields plus scoring columns.
/// `rank` stays NULL until the job has been ranked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub job_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub profile_url: String,
    pub avatar_url: Option<String>,
    pub followers: i32,
    pub public_repos: i32,
    pub repositories: Value,
    pub position: i32,
    pub matched_skills: Vec<String>,
    pub score: i32,
    pub experience: String,
    pub rationale: String,
    pub rank: Option<i32>,
    pub retrieved_at: DateTime<Utc>,
}

impl CandidateRow {
    /// Rebuilds the in-memory profile from a stored row. Repositories that
    /// fail to deserialize (schema drift) degrade to an empty list.
    pub fn profile(&self) -> CandidateProfile {
        let repositories: Vec<RepoSummary> =
            serde_json::from_value(self.repositories.clone()).unwrap_or_default();
        CandidateProfile {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            profile_url: self.profile_url.clone(),
            avatar_url: self.avatar_url.clone(),
            followers: self.followers,
            public_repos: self.public_repos,
            repositories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_round_trips_repositories() {
        let row = CandidateRow {
            job_id: Uuid::new_v4(),
            username: "octocat".to_string(),
            display_name: Some("The Octocat".to_string()),
            email: None,
            bio: None,
            company: None,
            location: Some("San Francisco".to_string()),
            profile_url: "https://github.com/octocat".to_string(),
            avatar_url: None,
            followers: 100,
            public_repos: 8,
            repositories: json!([
                {"name": "hello-world", "url": "https://github.com/octocat/hello-world",
                 "stars": 42, "topics": ["demo"], "description": null}
            ]),
            position: 0,
            matched_skills: vec![],
            score: 0,
            experience: "Not assessed".to_string(),
            rationale: String::new(),
            rank: None,
            retrieved_at: Utc::now(),
        };

        let profile = row.profile();
        assert_eq!(profile.username, "octocat");
        assert_eq!(profile.repositories.len(), 1);
        assert_eq!(profile.repositories[0].stars, 42);
        assert_eq!(profile.repositories[0].topics, vec!["demo".to_string()]);
    }

    #[test]
    fn test_profile_tolerates_malformed_repositories() {
        let row = CandidateRow {
            job_id: Uuid::new_v4(),
            username: "octocat".to_string(),
            display_name: None,
            email: None,
            bio: None,
            company: None,
            location: None,
            profile_url: "https://github.com/octocat".to_string(),
            avatar_url: None,
            followers: 0,
            public_repos: 0,
            repositories: json!({"not": "a repo list"}),
            position: 0,
            matched_skills: vec![],
            score: 0,
            experience: "Not assessed".to_string(),
            rationale: String::new(),
            rank: None,
            retrieved_at: Utc::now(),
        };
        assert!(row.profile().repositories.is_empty());
    }
}
