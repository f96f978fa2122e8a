// Integration tests for SkillSwap Match

use skillswap_match::core::{distance::haversine_distance, Matcher};
use skillswap_match::models::{LocationScoring, MatchCandidate, ScoringWeights, Skill, UserProfile};

const BERLIN: (f64, f64) = (52.5200, 13.4050);

fn create_candidate(id: &str, lat: f64, lon: f64, offers: &[&str], seeks: &[&str]) -> MatchCandidate {
    let offered = offers
        .iter()
        .map(|name| Skill::offered(&format!("{}-{}", id, name), id, name))
        .collect();
    let sought = seeks
        .iter()
        .map(|name| Skill::sought(&format!("{}-{}", id, name), id, name))
        .collect();
    MatchCandidate::new(UserProfile::new(id).with_location(lat, lon), offered, sought)
}

fn create_requester() -> UserProfile {
    UserProfile::new("current_user").with_location(BERLIN.0, BERLIN.1)
}

fn seeks(names: &[&str]) -> Vec<Skill> {
    names
        .iter()
        .map(|name| Skill::sought(name, "current_user", name))
        .collect()
}

/// Point `km` kilometers due north of Berlin
fn north_of_berlin(km: f64) -> (f64, f64) {
    (BERLIN.0 + km / 111.195, BERLIN.1)
}

#[test]
fn test_integration_end_to_end_matching() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();

    let candidates = vec![
        create_candidate("1", 52.5210, 13.4100, &["Guitar", "Piano"], &["Spanish"]), // Close, full overlap
        create_candidate("2", 52.5300, 13.4200, &["Guitar"], &[]),                   // Close, half overlap
        create_candidate("3", 48.1351, 11.5820, &["Guitar", "Piano"], &[]),          // Munich, full overlap
        create_candidate("4", 52.5210, 13.4100, &["Cooking"], &[]),                  // Close, no overlap
        create_candidate("current_user", BERLIN.0, BERLIN.1, &["Guitar", "Piano"], &[]), // Self
        MatchCandidate::new(UserProfile::new("5"), vec![Skill::offered("x", "5", "piano")], vec![]), // No location
    ];

    let result = matcher.find_matches(&requester, &seeks(&["Guitar", "Piano"]), &candidates);

    let ids: Vec<_> = result.iter().map(|c| c.user.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "5", "4"]);

    // 0.5 * 0.6 + 1.0 * 0.4
    assert!((result[1].score - 0.7).abs() < 1e-9);
    // 1.0 * 0.6 + 0.1 * 0.4
    assert!((result[2].score - 0.64).abs() < 1e-9);
    // 0.5 * 0.6 + 0.3 * 0.4
    assert!((result[3].score - 0.42).abs() < 1e-9);
    assert_eq!(result[3].distance, None);
}

#[test]
fn test_self_exclusion_regardless_of_score() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();

    let candidates: Vec<MatchCandidate> = (0..10)
        .map(|i| {
            let id = if i % 3 == 0 { "current_user".to_string() } else { i.to_string() };
            create_candidate(&id, BERLIN.0, BERLIN.1, &["Guitar"], &[])
        })
        .collect();

    let result = matcher.find_matches(&requester, &seeks(&["Guitar"]), &candidates);

    assert_eq!(result.len(), 6);
    assert!(result.iter().all(|c| c.user.id != "current_user"));
}

#[test]
fn test_score_bounds() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();
    let skills = ["Guitar", "Piano", "Spanish", "Cooking", "Yoga"];

    let candidates: Vec<MatchCandidate> = (0..60)
        .map(|i| {
            let (lat, lon) = north_of_berlin(i as f64 * 2.5);
            let offers: Vec<&str> = skills.iter().copied().take(i % skills.len()).collect();
            create_candidate(&format!("c{}", i), lat, lon, &offers, &[])
        })
        .collect();

    let result = matcher.find_matches(&requester, &seeks(&["Guitar", "Piano", "Yoga"]), &candidates);

    assert_eq!(result.len(), 60);
    for m in &result {
        assert!(
            m.score >= 0.0 && m.score <= 1.0,
            "Score {} is out of range [0, 1]",
            m.score
        );
    }
}

#[test]
fn test_location_monotonicity() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();

    let distances = [6.0, 12.0, 18.0, 25.0, 33.0, 41.0, 49.0];
    let candidates: Vec<MatchCandidate> = distances
        .iter()
        .rev()
        .map(|km| {
            let (lat, lon) = north_of_berlin(*km);
            create_candidate(&format!("at-{}", km), lat, lon, &["Guitar"], &[])
        })
        .collect();

    let result = matcher.find_matches(&requester, &seeks(&["Guitar"]), &candidates);

    for pair in result.windows(2) {
        let (a, b) = (pair[0].distance.unwrap(), pair[1].distance.unwrap());
        if a < b {
            assert!(pair[0].score >= pair[1].score);
        }
    }
    // Strictly decaying part of the curve keeps distance order
    let tail: Vec<f64> = result.iter().skip(2).map(|c| c.distance.unwrap()).collect();
    assert!(tail.windows(2).all(|w| w[0] < w[1]), "got {:?}", tail);
}

#[test]
fn test_sorted_non_increasing() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();

    let candidates: Vec<MatchCandidate> = (0..40)
        .map(|i| {
            let (lat, lon) = north_of_berlin((i * 7 % 90) as f64);
            let offers: &[&str] = if i % 2 == 0 { &["Guitar"] } else { &["Piano", "Drums"] };
            create_candidate(&format!("c{:02}", i), lat, lon, offers, &[])
        })
        .collect();

    let result = matcher.find_matches(&requester, &seeks(&["Guitar", "Drums"]), &candidates);

    for pair in result.windows(2) {
        assert!(pair[0].score >= pair[1].score, "Matches not sorted by score");
        if pair[0].score == pair[1].score {
            assert!(pair[0].user.id < pair[1].user.id, "Ties not ordered by id");
        }
    }
}

#[test]
fn test_distance_filled_in() {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();
    let (lat, lon) = (52.3906, 13.0645);

    let result = matcher.find_matches(
        &requester,
        &seeks(&["Guitar"]),
        &[create_candidate("potsdam", lat, lon, &["Guitar"], &[])],
    );

    let expected = haversine_distance(BERLIN.0, BERLIN.1, lat, lon);
    assert_eq!(result[0].distance, Some(expected));
}

#[test]
fn test_location_only_weights() {
    let matcher = Matcher::new(
        ScoringWeights { skill: 0.0, location: 1.0 },
        LocationScoring::default(),
    );
    let requester = create_requester();

    let candidates = vec![
        create_candidate("far", 48.1351, 11.5820, &["Guitar"], &[]),
        create_candidate("near", 52.5210, 13.4100, &[], &[]),
    ];

    let result = matcher.find_matches(&requester, &seeks(&["Guitar"]), &candidates);

    assert_eq!(result[0].user.id, "near");
    assert_eq!(result[0].score, 1.0);
}
