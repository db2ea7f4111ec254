//! Reconciler & Ranker — joins oracle output back onto fetched profiles.
//!
//! The oracle may return fewer entries than it was given, mislabel them, or
//! say nothing usable at all. Reconciliation guarantees that every fetched
//! candidate appears in the final ranking exactly once, in a total order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::candidate::{CandidateProfile, CandidateRow};
use crate::oracle::scorer::{ScoreResult, NOT_ASSESSED};

const NO_SCORE_DATA: &str = "No scoring data available";

/// Final pipeline output for one candidate: the fetched profile joined
/// with its (possibly defaulted) score, plus a 1-based rank.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub profile: CandidateProfile,
    pub matched_skills: Vec<String>,
    pub score: i32,
    pub experience: String,
    pub rationale: String,
    pub rank: i32,
    /// Index in the original fetch order; the tie-break under equal scores.
    pub position: i32,
    pub retrieved_at: DateTime<Utc>,
}

impl RankedCandidate {
    /// Converts to the persisted row shape for a given job.
    pub fn to_row(&self, job_id: Uuid) -> CandidateRow {
        CandidateRow {
            job_id,
            username: self.profile.username.clone(),
            display_name: self.profile.display_name.clone(),
            email: self.profile.email.clone(),
            bio: self.profile.bio.clone(),
            company: self.profile.company.clone(),
            location: self.profile.location.clone(),
            profile_url: self.profile.profile_url.clone(),
            avatar_url: self.profile.avatar_url.clone(),
            followers: self.profile.followers,
            public_repos: self.profile.public_repos,
            repositories: serde_json::to_value(&self.profile.repositories)
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
            position: self.position,
            matched_skills: self.matched_skills.clone(),
            score: self.score,
            experience: self.experience.clone(),
            rationale: self.rationale.clone(),
            rank: Some(self.rank),
            retrieved_at: self.retrieved_at,
        }
    }
}

/// Joins score results onto candidates by identity key, fills gaps with
/// defaults, and produces a total order: score descending, original fetch
/// order on ties, 1-based ranks.
pub fn reconcile(
    candidates: Vec<CandidateProfile>,
    score_results: Vec<ScoreResult>,
    retrieved_at: DateTime<Utc>,
) -> Vec<RankedCandidate> {
    let mut by_identity: HashMap<String, ScoreResult> = HashMap::new();
    for result in score_results {
        if let Some(identity) = result.identity() {
            // Later entries win, matching upsert semantics elsewhere.
            by_identity.insert(identity, result);
        }
    }

    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .enumerate()
        .map(|(position, profile)| {
            let (matched_skills, score, experience, rationale) =
                match by_identity.remove(&profile.username) {
                    Some(result) => (
                        result.matched_skills,
                        result.score,
                        result.experience,
                        result.rationale,
                    ),
                    None => (
                        Vec::new(),
                        0,
                        NOT_ASSESSED.to_string(),
                        NO_SCORE_DATA.to_string(),
                    ),
                };
            RankedCandidate {
                profile,
                matched_skills,
                score,
                experience,
                rationale,
                rank: 0,
                position: position as i32,
                retrieved_at,
            }
        })
        .collect();

    // Vec::sort_by is stable, so equal scores keep fetch order.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    for (index, candidate) in ranked.iter_mut().enumerate() {
        candidate.rank = index as i32 + 1;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::scorer::{fallback_results, score_from_text, SCORING_UNAVAILABLE};
    use serde_json::json;

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
            followers: 0,
            public_repos: 0,
            repositories: Vec::new(),
        }
    }

    fn score(username: &str, score: i32) -> ScoreResult {
        ScoreResult::from_value(&json!({
            "username": username,
            "skill_matching_score": score,
            "matched_skills": [],
            "hands_on_experience": "some",
            "summary": "fine"
        }))
        .unwrap()
    }

    #[test]
    fn test_every_candidate_appears_exactly_once() {
        let candidates = vec![profile("a"), profile("b"), profile("c")];
        let scores = vec![score("b", 80)];
        let ranked = reconcile(candidates, scores, Utc::now());
        assert_eq!(ranked.len(), 3);
        let mut usernames: Vec<_> = ranked.iter().map(|r| r.profile.username.clone()).collect();
        usernames.sort();
        assert_eq!(usernames, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sorted_descending_with_one_based_ranks() {
        let candidates = vec![profile("low"), profile("high"), profile("mid")];
        let scores = vec![score("low", 10), score("high", 95), score("mid", 50)];
        let ranked = reconcile(candidates, scores, Utc::now());
        let scores: Vec<_> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![95, 50, 10]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let candidates = vec![profile("first"), profile("second"), profile("third")];
        let scores = vec![score("first", 50), score("second", 50), score("third", 50)];
        let ranked = reconcile(candidates, scores, Utc::now());
        let usernames: Vec<_> = ranked.iter().map(|r| r.profile.username.clone()).collect();
        assert_eq!(usernames, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unmatched_candidate_gets_default() {
        // Two candidates, the oracle only scored one.
        let candidates = vec![profile("scored"), profile("ignored")];
        let scores = vec![score("scored", 70)];
        let ranked = reconcile(candidates, scores, Utc::now());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].profile.username, "scored");
        assert_eq!(ranked[1].score, 0);
        assert_eq!(ranked[1].experience, NOT_ASSESSED);
        assert_eq!(ranked[1].rationale, NO_SCORE_DATA);
    }

    #[test]
    fn test_join_by_url_suffix() {
        // The oracle dropped the username but echoed the profile URL.
        let mut candidate = profile("a");
        candidate.profile_url = "https://x/a".to_string();
        let raw = r#"```json
[{"name":"A","github_url":"https://x/a","skill_matching_score":90}]
```"#;
        let scores = score_from_text(raw, std::slice::from_ref(&candidate));
        let ranked = reconcile(vec![candidate], scores, Utc::now());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 90);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_fallback_scores_rank_in_fetch_order() {
        // Oracle down: every candidate scores zero, ranks follow fetch order.
        let candidates = vec![profile("a"), profile("b"), profile("c")];
        let scores = fallback_results(&candidates);
        let ranked = reconcile(candidates, scores, Utc::now());
        assert_eq!(ranked.len(), 3);
        for (index, candidate) in ranked.iter().enumerate() {
            assert_eq!(candidate.score, 0);
            assert_eq!(candidate.rank, index as i32 + 1);
            assert_eq!(candidate.rationale, SCORING_UNAVAILABLE);
        }
        let usernames: Vec<_> = ranked.iter().map(|r| r.profile.username.clone()).collect();
        assert_eq!(usernames, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_to_row_carries_rank_and_scores() {
        let job_id = Uuid::new_v4();
        let ranked = reconcile(vec![profile("a")], vec![score("a", 42)], Utc::now());
        let row = ranked[0].to_row(job_id);
        assert_eq!(row.job_id, job_id);
        assert_eq!(row.username, "a");
        assert_eq!(row.score, 42);
        assert_eq!(row.rank, Some(1));
    }
}
