use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-job pipeline state. Stored as TEXT on the `jobs` row.
///
/// `Ranking` is a transient claim held while one request runs the scoring
/// pipeline; it prevents two concurrent rank requests from both recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    New,
    Fetched,
    Ranking,
    Ranked,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Fetched => "fetched",
            JobStatus::Ranking => "ranking",
            JobStatus::Ranked => "ranked",
        }
    }

    /// Unknown values map to `New` so a corrupted row can be re-fetched
    /// instead of wedging the job.
    pub fn parse(s: &str) -> Self {
        match s {
            "fetched" => JobStatus::Fetched,
            "ranking" => JobStatus::Ranking,
            "ranked" => JobStatus::Ranked,
            _ => JobStatus::New,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: Option<String>,
    pub desired_candidates: i32,
    pub company_name: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub experience_required: Option<String>,
    pub status: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ranked_at: Option<DateTime<Utc>>,
}

impl JobRow {
    pub fn state(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

/// Job intake payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJobRequest {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub location: Option<String>,
    pub desired_candidates: i32,
    pub company_name: Option<String>,
    pub salary: Option<String>,
    pub employment_type: Option<String>,
    pub experience_required: Option<String>,
}

impl NewJobRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description must not be empty".to_string());
        }
        if self.required_skills.iter().all(|s| s.trim().is_empty()) {
            return Err("at least one required skill must be provided".to_string());
        }
        if self.desired_candidates < 1 {
            return Err("desired_candidates must be a positive integer".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewJobRequest {
        NewJobRequest {
            title: "Backend Engineer".to_string(),
            description: "Build services".to_string(),
            required_skills: vec!["Rust".to_string()],
            location: Some("Berlin".to_string()),
            desired_candidates: 10,
            company_name: None,
            salary: None,
            employment_type: None,
            experience_required: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut req = request();
        req.title = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_skills_rejected() {
        let mut req = request();
        req.required_skills = vec!["".to_string(), "  ".to_string()];
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_zero_candidates_rejected() {
        let mut req = request();
        req.desired_candidates = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::New,
            JobStatus::Fetched,
            JobStatus::Ranking,
            JobStatus::Ranked,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_maps_to_new() {
        assert_eq!(JobStatus::parse("garbage"), JobStatus::New);
    }
}
