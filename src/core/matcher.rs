use std::cmp::Ordering;

use crate::models::{LocationScoring, MatchCandidate, MatchExplanation, ScoringWeights, Skill, UserProfile};
use crate::core::{
    distance::profile_distance,
    filters::is_self_match,
    scoring::{combined_score, location_score, shared_skill_names, skill_match_score},
};

/// Score carried by candidates that must never be surfaced
pub const EXCLUDED_SCORE: f64 = -1.0;

/// Ranks candidates for a requester by skill overlap and proximity
///
/// # Pipeline
/// 1. Self-match exclusion
/// 2. Distance (only when both sides have valid coordinates)
/// 3. Location and skill scores, weighted
/// 4. Descending sort, ties by user id
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    weights: ScoringWeights,
    location: LocationScoring,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, location: LocationScoring) -> Self {
        Self { weights, location }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank `candidates` for `requester`
    ///
    /// Returns new records with `score` and `distance` filled in; the
    /// caller's candidates are left untouched. Nothing is truncated.
    ///
    /// # Arguments
    /// * `requester` - Profile the matches are computed for
    /// * `sought_skills` - Skills the requester is looking for
    /// * `candidates` - Potential partners with their skill lists populated
    pub fn find_matches(
        &self,
        requester: &UserProfile,
        sought_skills: &[Skill],
        candidates: &[MatchCandidate],
    ) -> Vec<MatchCandidate> {
        if sought_skills.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<MatchCandidate> = candidates
            .iter()
            .map(|candidate| self.score_candidate(requester, sought_skills, candidate))
            .filter(|candidate| !is_self_match(requester, candidate))
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user.id.cmp(&b.user.id))
        });

        tracing::trace!(
            requester = %requester.id,
            considered = candidates.len(),
            ranked = ranked.len(),
            "ranked candidates"
        );

        ranked
    }

    fn score_candidate(
        &self,
        requester: &UserProfile,
        sought_skills: &[Skill],
        candidate: &MatchCandidate,
    ) -> MatchCandidate {
        if is_self_match(requester, candidate) {
            return MatchCandidate {
                score: EXCLUDED_SCORE,
                distance: None,
                ..candidate.clone()
            };
        }

        let distance = profile_distance(requester, &candidate.user);
        let location = location_score(distance, &self.location);
        let skill = skill_match_score(sought_skills, &candidate.offered_skills);

        MatchCandidate {
            score: combined_score(skill, location, &self.weights),
            distance,
            ..candidate.clone()
        }
    }

    /// Skill names behind a candidate's ranking, in both directions
    pub fn explain(
        &self,
        candidate: &MatchCandidate,
        requester_sought: &[Skill],
        requester_offered: &[Skill],
    ) -> MatchExplanation {
        MatchExplanation {
            matched_skills: shared_skill_names(requester_sought, &candidate.offered_skills),
            reciprocal_skills: shared_skill_names(&candidate.sought_skills, requester_offered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, lat: f64, lon: f64, offers: &[&str]) -> MatchCandidate {
        let offered = offers
            .iter()
            .enumerate()
            .map(|(i, name)| Skill::offered(&format!("{}-{}", id, i), id, name))
            .collect();
        MatchCandidate::new(UserProfile::new(id).with_location(lat, lon), offered, vec![])
    }

    fn requester() -> UserProfile {
        UserProfile::new("me").with_location(52.5200, 13.4050) // Berlin
    }

    fn seeks(names: &[&str]) -> Vec<Skill> {
        names.iter().map(|name| Skill::sought(name, "me", name)).collect()
    }

    #[test]
    fn test_find_matches_basic() {
        let matcher = Matcher::with_defaults();
        let candidates = vec![
            candidate("far", 48.1351, 11.5820, &["Guitar"]),   // Munich, ~500km
            candidate("near", 52.5210, 13.4100, &["guitar"]),  // <1km
            candidate("none", 52.5210, 13.4100, &["Cooking"]), // no overlap
        ];

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        let ids: Vec<_> = result.iter().map(|c| c.user.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "none"]);
        assert!((result[0].score - 1.0).abs() < 1e-9);
        assert!((result[1].score - (0.6 + 0.04)).abs() < 1e-9);
        assert!((result[2].score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_sought_skills_short_circuits() {
        let matcher = Matcher::with_defaults();
        let candidates = vec![candidate("a", 52.52, 13.40, &["Guitar"])];

        assert!(matcher.find_matches(&requester(), &[], &candidates).is_empty());
    }

    #[test]
    fn test_self_is_never_returned() {
        let matcher = Matcher::with_defaults();
        let candidates = vec![
            candidate("me", 52.5200, 13.4050, &["Guitar"]),
            candidate("other", 52.5200, 13.4050, &["Piano"]),
        ];

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user.id, "other");
    }

    #[test]
    fn test_zero_score_candidates_are_kept() {
        let matcher = Matcher::new(
            ScoringWeights { skill: 0.9, location: -0.5 },
            LocationScoring::default(),
        );
        let candidates = vec![candidate("other", 52.5210, 13.4100, &["Cooking"])];

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user.id, "other");
        assert_eq!(result[0].score, 0.0);
    }

    #[test]
    fn test_missing_location_uses_neutral_score() {
        let matcher = Matcher::with_defaults();
        let mut remote = candidate("remote", 0.0, 0.0, &["Guitar"]);
        remote.user.latitude = None;

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &[remote]);

        assert_eq!(result[0].distance, None);
        assert!((result[0].score - (0.6 + 0.3 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_ties_break_by_user_id() {
        let matcher = Matcher::with_defaults();
        let candidates = vec![
            candidate("c", 52.5200, 13.4050, &["Guitar"]),
            candidate("a", 52.5200, 13.4050, &["Guitar"]),
            candidate("b", 52.5200, 13.4050, &["Guitar"]),
        ];

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        let ids: Vec<_> = result.iter().map(|c| c.user.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let matcher = Matcher::with_defaults();
        let candidates = vec![candidate("a", 52.53, 13.41, &["Guitar"])];
        let before = candidates.clone();

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        assert_eq!(candidates, before);
        assert!(result[0].score > 0.0);
        assert!(result[0].distance.is_some());
    }

    #[test]
    fn test_custom_weights() {
        let matcher = Matcher::new(
            ScoringWeights { skill: 1.0, location: 0.0 },
            LocationScoring::default(),
        );
        let candidates = vec![
            candidate("far", 48.1351, 11.5820, &["Guitar"]),
            candidate("near", 52.5210, 13.4100, &["Cooking"]),
        ];

        let result = matcher.find_matches(&requester(), &seeks(&["Guitar"]), &candidates);

        assert_eq!(result[0].user.id, "far");
        assert_eq!(result[1].score, 0.0);
    }

    #[test]
    fn test_explain() {
        let matcher = Matcher::with_defaults();
        let mut other = candidate("other", 52.52, 13.40, &["Guitar", "Piano"]);
        other.sought_skills = vec![Skill::sought("x", "other", "spanish")];
        let my_offers = vec![Skill::offered("o", "me", "Spanish")];

        let explanation = matcher.explain(&other, &seeks(&["piano", "Drums"]), &my_offers);

        assert_eq!(explanation.matched_skills, vec!["piano"]);
        assert_eq!(explanation.reciprocal_skills, vec!["spanish"]);
    }
}
