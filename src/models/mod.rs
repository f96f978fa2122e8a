// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{UserProfile, Skill, MatchCandidate, MatchExplanation, MatchEvent, MatchEventType, ScoringWeights, LocationScoring};
pub use requests::{RankMatchesRequest, FindMatchesRequest, RecordEventRequest};
pub use responses::{ScoredMatch, FindMatchesResponse, HealthResponse, ErrorResponse, RecordEventResponse};
