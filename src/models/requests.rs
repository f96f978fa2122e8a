use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{MatchCandidate, Skill, UserProfile};

/// Request to rank caller-supplied candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankMatchesRequest {
    #[validate(custom(function = "validate_profile_id"))]
    pub requester: UserProfile,
    #[serde(default, alias = "sought_skills")]
    pub sought_skills: Vec<Skill>,
    #[serde(default, alias = "offered_skills")]
    pub offered_skills: Vec<Skill>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub candidates: Vec<MatchCandidate>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

fn validate_profile_id(profile: &UserProfile) -> Result<(), validator::ValidationError> {
    if profile.id.trim().is_empty() {
        return Err(validator::ValidationError::new("empty_id"));
    }
    Ok(())
}

/// Request to find matches for a stored user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
    #[serde(default)]
    #[serde(alias = "exclude_user_ids", rename = "excludeUserIds")]
    pub exclude_user_ids: Vec<String>,
}

/// Request to record an action on a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordEventRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: String,
    #[serde(alias = "event_type", rename = "eventType")]
    pub event_type: String,
}
