use std::collections::HashSet;

use crate::models::{LocationScoring, ScoringWeights, Skill};

/// Map a distance (km) to a desirability score (0-1)
///
/// Step function near the user, then a linear decay towards the floor:
/// ```text
/// None / NaN / inf -> unknown_score (0.3)
/// d < 0          -> 0
/// d <= near_km   -> near_score (1.0)
/// d <= mid_km    -> mid_score (0.8)
/// d <= max_km    -> max(floor, near_score - (d - near_km) / (max_km - near_km) * (near_score - floor))
/// d >  max_km    -> floor_score (0.1)
/// ```
pub fn location_score(distance_km: Option<f64>, scoring: &LocationScoring) -> f64 {
    let distance = match distance_km {
        Some(d) if d.is_finite() => d,
        _ => return scoring.unknown_score,
    };

    if distance < 0.0 {
        return 0.0;
    }
    if distance <= scoring.near_km {
        return scoring.near_score;
    }
    if distance <= scoring.mid_km {
        return scoring.mid_score;
    }
    if distance <= scoring.max_km {
        let span = scoring.max_km - scoring.near_km;
        let decay = (distance - scoring.near_km) / span * (scoring.near_score - scoring.floor_score);
        return scoring.floor_score.max(scoring.near_score - decay);
    }

    scoring.floor_score
}

/// Fraction of sought skills the other side offers (0-1)
///
/// Names are compared exactly after lowercasing; there is no fuzzy, synonym
/// or category matching. Duplicates in `sought` count individually.
pub fn skill_match_score(sought: &[Skill], offered: &[Skill]) -> f64 {
    if sought.is_empty() || offered.is_empty() {
        return 0.0;
    }

    let offered_names = lowercase_names(offered);
    let hits = sought
        .iter()
        .filter(|skill| offered_names.contains(&skill.name.to_lowercase()))
        .count();

    hits as f64 / sought.len() as f64
}

/// Weighted combination of the skill and location factors, clamped to 0-1
#[inline]
pub fn combined_score(skill_score: f64, location_score: f64, weights: &ScoringWeights) -> f64 {
    (skill_score * weights.skill + location_score * weights.location).clamp(0.0, 1.0)
}

/// Names in `wanted` that `available` carries, in `wanted` order, deduplicated
/// case-insensitively
pub fn shared_skill_names(wanted: &[Skill], available: &[Skill]) -> Vec<String> {
    let available_names = lowercase_names(available);
    let mut seen = HashSet::new();

    wanted
        .iter()
        .filter(|skill| {
            let key = skill.name.to_lowercase();
            available_names.contains(&key) && seen.insert(key)
        })
        .map(|skill| skill.name.clone())
        .collect()
}

fn lowercase_names(skills: &[Skill]) -> HashSet<String> {
    skills.iter().map(|s| s.name.to_lowercase()).collect()
}
