// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod scoring;

pub use distance::{haversine_distance, is_valid_coordinate, profile_distance};
pub use filters::{partition_skills, is_self_match, without_excluded};
pub use matcher::{Matcher, EXCLUDED_SCORE};
pub use scoring::{location_score, skill_match_score, combined_score, shared_skill_names};
