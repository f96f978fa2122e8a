//! SkillSwap Match - skill matching and ranking service for SkillSwap
//!
//! Ranks potential skill-exchange partners for a user by how many of the
//! skills they seek a candidate offers (60%) and how close the candidate
//! lives (40%). The ranking core is pure; the HTTP layer loads profiles and
//! skills from Supabase and remembers which candidates a user already acted on.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use crate::core::{Matcher, distance::haversine_distance, scoring::{location_score, skill_match_score}};
pub use models::{UserProfile, Skill, MatchCandidate, ScoringWeights, LocationScoring, ScoredMatch, FindMatchesResponse};
