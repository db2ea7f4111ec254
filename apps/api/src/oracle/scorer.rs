//! Scoring Oracle Client — one batched scoring call, defensively wrapped.
//!
//! The model is an untrusted, latency-variable collaborator that sometimes
//! returns malformed output. Nothing it says crosses this boundary without
//! validation, and no failure mode escapes: every path resolves to a
//! concrete `Vec<ScoreResult>`, falling back to a deterministic zero-score
//! ranking when the oracle cannot be used.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::candidate::CandidateProfile;
use crate::models::job::JobRow;
use crate::oracle::extract::extract;
use crate::oracle::prompts::{SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM};
use crate::oracle::LlmClient;
use crate::sourcing::normalize::normalize;

/// Rationale attached when the oracle path failed entirely.
pub const SCORING_UNAVAILABLE: &str = "Scoring unavailable";
/// Experience sentinel for candidates the oracle did not assess.
pub const NOT_ASSESSED: &str = "Not assessed";
const NOT_SPECIFIED: &str = "Not specified";
const NO_SUMMARY: &str = "No summary provided.";

/// One validated score entry. Built only through `from_value` or
/// `fallback`, never deserialized directly from oracle output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub username: Option<String>,
    pub github_url: Option<String>,
    pub score: i32,
    pub matched_skills: Vec<String>,
    pub experience: String,
    pub rationale: String,
}

impl ScoreResult {
    /// Coerces one untrusted oracle entry into the strict schema.
    /// Non-mapping entries yield `None` and are dropped by the caller.
    pub fn from_value(value: &Value) -> Option<ScoreResult> {
        let map = value.as_object()?;
        Some(ScoreResult {
            username: str_field(map, "username"),
            github_url: str_field(map, "github_url"),
            score: coerce_score(map.get("skill_matching_score")),
            matched_skills: map
                .get("matched_skills")
                .and_then(Value::as_array)
                .map(|skills| {
                    skills
                        .iter()
                        .filter_map(|s| s.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
            experience: str_field(map, "hands_on_experience")
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            rationale: str_field(map, "summary").unwrap_or_else(|| NO_SUMMARY.to_string()),
        })
    }

    /// Deterministic zero-score entry for one candidate, used when the
    /// whole oracle call failed.
    pub fn fallback(profile: &CandidateProfile) -> ScoreResult {
        ScoreResult {
            username: Some(profile.username.clone()),
            github_url: Some(profile.profile_url.clone()),
            score: 0,
            matched_skills: Vec::new(),
            experience: NOT_ASSESSED.to_string(),
            rationale: SCORING_UNAVAILABLE.to_string(),
        }
    }

    /// The identity key used to join this entry back to a fetched profile:
    /// the echoed username, or the profile URL's last path segment when the
    /// oracle ignored the echo instruction.
    pub fn identity(&self) -> Option<String> {
        if let Some(username) = self.username.as_deref() {
            if !username.is_empty() {
                return Some(username.to_string());
            }
        }
        let url = self.github_url.as_deref()?;
        let tail = url.trim_end_matches('/').rsplit('/').next()?;
        if tail.is_empty() {
            None
        } else {
            Some(tail.to_string())
        }
    }
}

fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Score coercion: integers and floats are truncated and clamped to 0–100;
/// numeric strings are tolerated; everything else is 0.
fn coerce_score(value: Option<&Value>) -> i32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    (raw as i32).clamp(0, 100)
}

/// One fallback entry per input candidate, in input order.
pub fn fallback_results(candidates: &[CandidateProfile]) -> Vec<ScoreResult> {
    candidates.iter().map(ScoreResult::fallback).collect()
}

/// Extracts, validates, and coerces a raw oracle completion.
/// Any failure (unparseable text, a non-array value, an array with no
/// usable entries) resolves to the fallback ranking.
pub fn score_from_text(raw: &str, candidates: &[CandidateProfile]) -> Vec<ScoreResult> {
    let value = match extract(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("oracle output extraction failed: {e}");
            return fallback_results(candidates);
        }
    };

    let entries = match value {
        Value::Array(entries) => entries,
        _ => {
            warn!("oracle returned a non-array JSON value");
            return fallback_results(candidates);
        }
    };

    let results: Vec<ScoreResult> = entries.iter().filter_map(ScoreResult::from_value).collect();
    if results.is_empty() {
        warn!("oracle array contained no usable entries");
        return fallback_results(candidates);
    }
    results
}

/// The scorer seam. `AppState` carries an `Arc<dyn CandidateScorer>`, so
/// tests and future backends swap in without touching the pipeline.
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    /// Scores a non-empty candidate batch against a job.
    ///
    /// Infallible by contract: implementations resolve every upstream
    /// failure internally, at worst returning the fallback ranking.
    async fn score(&self, job: &JobRow, candidates: &[CandidateProfile]) -> Vec<ScoreResult>;
}

/// Production scorer: single batched prompt through the `LlmClient`.
pub struct OracleScorer {
    llm: LlmClient,
}

impl OracleScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CandidateScorer for OracleScorer {
    async fn score(&self, job: &JobRow, candidates: &[CandidateProfile]) -> Vec<ScoreResult> {
        let prompt = build_scoring_prompt(job, candidates);
        debug!(
            "scoring {} candidates for job {} in one batched call",
            candidates.len(),
            job.id
        );

        let response = match self.llm.call(&prompt, SCORING_SYSTEM).await {
            Ok(response) => response,
            Err(e) => {
                warn!("oracle call failed for job {}: {e}", job.id);
                return fallback_results(candidates);
            }
        };

        match response.text() {
            Some(text) => score_from_text(text, candidates),
            None => {
                warn!("oracle returned no text content for job {}", job.id);
                fallback_results(candidates)
            }
        }
    }
}

/// Builds the batched prompt: normalized job JSON plus the normalized
/// candidate batch.
pub fn build_scoring_prompt(job: &JobRow, candidates: &[CandidateProfile]) -> String {
    let job_json = normalize(serde_json::to_value(job).unwrap_or_default());
    let candidates_json = normalize(serde_json::to_value(candidates).unwrap_or_default());

    SCORING_PROMPT_TEMPLATE
        .replace(
            "{job_json}",
            &serde_json::to_string_pretty(&job_json).unwrap_or_default(),
        )
        .replace(
            "{candidates_json}",
            &serde_json::to_string_pretty(&candidates_json).unwrap_or_default(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn profile(username: &str) -> CandidateProfile {
        CandidateProfile {
            username: username.to_string(),
            display_name: None,
            email: None,
            bio: None,
            company: None,
            location: None,
            profile_url: format!("https://github.com/{username}"),
            avatar_url: None,
            followers: 25,
            public_repos: 3,
            repositories: Vec::new(),
        }
    }

    fn job() -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "Platform Engineer".to_string(),
            description: "Keep the lights on".to_string(),
            required_skills: vec!["Go".to_string(), "Kubernetes".to_string()],
            location: Some("Berlin".to_string()),
            desired_candidates: 5,
            company_name: None,
            salary: None,
            employment_type: None,
            experience_required: None,
            status: "fetched".to_string(),
            summary: None,
            created_at: Utc::now(),
            ranked_at: None,
        }
    }

    #[test]
    fn test_from_value_coerces_full_entry() {
        let entry = json!({
            "username": "alice",
            "github_url": "https://github.com/alice",
            "hands_on_experience": "Ships Go services",
            "skill_matching_score": 87,
            "matched_skills": ["Go", "Kubernetes"],
            "summary": "Strong match"
        });
        let result = ScoreResult::from_value(&entry).unwrap();
        assert_eq!(result.score, 87);
        assert_eq!(result.matched_skills, vec!["Go", "Kubernetes"]);
        assert_eq!(result.identity().as_deref(), Some("alice"));
    }

    #[test]
    fn test_from_value_defaults_missing_fields() {
        let result = ScoreResult::from_value(&json!({})).unwrap();
        assert_eq!(result.score, 0);
        assert!(result.matched_skills.is_empty());
        assert_eq!(result.experience, NOT_SPECIFIED);
        assert_eq!(result.rationale, NO_SUMMARY);
        assert_eq!(result.identity(), None);
    }

    #[test]
    fn test_from_value_rejects_non_mapping() {
        assert!(ScoreResult::from_value(&json!("just a string")).is_none());
        assert!(ScoreResult::from_value(&json!(42)).is_none());
    }

    #[test]
    fn test_score_coercion() {
        assert_eq!(coerce_score(Some(&json!(90))), 90);
        assert_eq!(coerce_score(Some(&json!(90.7))), 90);
        assert_eq!(coerce_score(Some(&json!("73"))), 73);
        assert_eq!(coerce_score(Some(&json!("very strong"))), 0);
        assert_eq!(coerce_score(Some(&json!(null))), 0);
        assert_eq!(coerce_score(Some(&json!(150))), 100);
        assert_eq!(coerce_score(Some(&json!(-5))), 0);
        assert_eq!(coerce_score(None), 0);
    }

    #[test]
    fn test_non_list_skills_discarded() {
        let entry = json!({"matched_skills": "Go, Kubernetes"});
        let result = ScoreResult::from_value(&entry).unwrap();
        assert!(result.matched_skills.is_empty());
    }

    #[test]
    fn test_identity_falls_back_to_url_suffix() {
        let entry = json!({"github_url": "https://x/a"});
        let result = ScoreResult::from_value(&entry).unwrap();
        assert_eq!(result.identity().as_deref(), Some("a"));

        let trailing = json!({"github_url": "https://github.com/bob/"});
        let result = ScoreResult::from_value(&trailing).unwrap();
        assert_eq!(result.identity().as_deref(), Some("bob"));
    }

    #[test]
    fn test_score_from_text_happy_path() {
        let raw = r#"```json
[{"username": "alice", "skill_matching_score": 90},
 {"username": "bob", "skill_matching_score": 40}]
```"#;
        let results = score_from_text(raw, &[profile("alice"), profile("bob")]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, 90);
        assert_eq!(results[1].score, 40);
    }

    #[test]
    fn test_score_from_text_non_array_falls_back() {
        let candidates = [profile("alice"), profile("bob")];
        let results = score_from_text(r#"{"username": "alice"}"#, &candidates);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 0));
        assert!(results.iter().all(|r| r.rationale == SCORING_UNAVAILABLE));
    }

    #[test]
    fn test_score_from_text_garbage_falls_back() {
        let candidates = [profile("alice")];
        let results = score_from_text("the model had a bad day", &candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].experience, NOT_ASSESSED);
    }

    #[test]
    fn test_score_from_text_drops_non_mapping_entries() {
        let candidates = [profile("alice"), profile("bob")];
        let raw = r#"[{"username": "alice", "skill_matching_score": 55}, "noise", 12]"#;
        let results = score_from_text(raw, &candidates);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity().as_deref(), Some("alice"));
    }

    #[test]
    fn test_fallback_results_cover_every_candidate_in_order() {
        let candidates = [profile("a"), profile("b"), profile("c")];
        let results = fallback_results(&candidates);
        assert_eq!(results.len(), 3);
        let identities: Vec<_> = results.iter().filter_map(|r| r.identity()).collect();
        assert_eq!(identities, vec!["a", "b", "c"]);
        assert!(results.iter().all(|r| r.score == 0));
    }

    #[test]
    fn test_prompt_carries_job_and_usernames() {
        let prompt = build_scoring_prompt(&job(), &[profile("alice")]);
        assert!(prompt.contains("Platform Engineer"));
        assert!(prompt.contains("\"alice\""));
        assert!(prompt.contains("JOB DETAILS:"));
        // Storage bookkeeping must not leak into the oracle payload.
        assert!(!prompt.contains("\"status\""));
    }
}
