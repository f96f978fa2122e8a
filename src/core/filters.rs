use std::collections::HashSet;

use crate::models::{MatchCandidate, Skill, UserProfile};

/// Split a user's skills into (offered, sought)
pub fn partition_skills(skills: Vec<Skill>) -> (Vec<Skill>, Vec<Skill>) {
    skills.into_iter().partition(|skill| skill.is_offering)
}

/// A requester never matches against their own profile
#[inline]
pub fn is_self_match(requester: &UserProfile, candidate: &MatchCandidate) -> bool {
    candidate.user.id == requester.id
}

/// Drop candidates whose user id is in `exclude_ids`
///
/// Used for caller-supplied exclusions and for users the requester already
/// acted on.
pub fn without_excluded(candidates: Vec<MatchCandidate>, exclude_ids: &[String]) -> Vec<MatchCandidate> {
    if exclude_ids.is_empty() {
        return candidates;
    }

    let excluded: HashSet<&str> = exclude_ids.iter().map(String::as_str).collect();
    candidates
        .into_iter()
        .filter(|c| !excluded.contains(c.user.id.as_str()))
        .collect()
}
