use serde::{Deserialize, Serialize};

use crate::models::domain::{MatchCandidate, MatchExplanation};

/// Ranked match as returned over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    pub user_id: String,
    pub score: f64,
    pub distance_km: Option<f64>,
    pub availability: Option<String>,
    pub offered_skills: Vec<String>,
    pub sought_skills: Vec<String>,
    pub matched_skills: Vec<String>,
    pub reciprocal_skills: Vec<String>,
}

impl ScoredMatch {
    pub fn new(candidate: MatchCandidate, explanation: MatchExplanation) -> Self {
        Self {
            user_id: candidate.user.id,
            score: candidate.score,
            distance_km: candidate.distance,
            availability: candidate.user.availability,
            offered_skills: candidate.offered_skills.into_iter().map(|s| s.name).collect(),
            sought_skills: candidate.sought_skills.into_iter().map(|s| s.name).collect(),
            matched_skills: explanation.matched_skills,
            reciprocal_skills: explanation.reciprocal_skills,
        }
    }
}

/// Response for the rank and find endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub matches: Vec<ScoredMatch>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Record event response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    pub success: bool,
    /// Row id in `match_events`; stable across repeated events for a pair
    pub event_id: i64,
}
