use serde::{Deserialize, Serialize};

/// Participant in matching, as stored in the `profiles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub availability: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            latitude: None,
            longitude: None,
            availability: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, if the profile carries them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// A skill a user offers (`is_offering = true`) or seeks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub is_offering: bool,
}

impl Skill {
    pub fn offered(id: &str, user_id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            category: String::new(),
            is_offering: true,
        }
    }

    pub fn sought(id: &str, user_id: &str, name: &str) -> Self {
        Self {
            is_offering: false,
            ..Self::offered(id, user_id, name)
        }
    }
}

/// Prospective partner for a requester
///
/// `score` and `distance` are filled in by ranking; the caller only needs to
/// populate the user and the two skill lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub user: UserProfile,
    #[serde(default)]
    pub offered_skills: Vec<Skill>,
    #[serde(default)]
    pub sought_skills: Vec<Skill>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl MatchCandidate {
    pub fn new(user: UserProfile, offered_skills: Vec<Skill>, sought_skills: Vec<Skill>) -> Self {
        Self {
            user,
            offered_skills,
            sought_skills,
            score: 0.0,
            distance: None,
        }
    }
}

/// Why a candidate was recommended
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    /// Skills the requester seeks that the candidate offers
    pub matched_skills: Vec<String>,
    /// Skills the candidate seeks that the requester offers
    pub reciprocal_skills: Vec<String>,
}

/// Action a user took on a recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    pub user_id: String,
    pub target_user_id: String,
    pub event_type: MatchEventType,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "match_event_type", rename_all = "snake_case")]
pub enum MatchEventType {
    Viewed,
    Dismissed,
    Contacted,
    TradeProposed,
}

impl MatchEventType {
    pub const ALL: [MatchEventType; 4] = [
        MatchEventType::Viewed,
        MatchEventType::Dismissed,
        MatchEventType::Contacted,
        MatchEventType::TradeProposed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchEventType::Viewed => "viewed",
            MatchEventType::Dismissed => "dismissed",
            MatchEventType::Contacted => "contacted",
            MatchEventType::TradeProposed => "trade_proposed",
        }
    }

    /// Case-insensitive parse of the wire name
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Scoring weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub skill: f64,
    pub location: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.6,
            location: 0.4,
        }
    }
}

/// Distance breakpoints (km) and the scores attached to them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationScoring {
    pub near_km: f64,
    pub mid_km: f64,
    pub max_km: f64,
    pub near_score: f64,
    pub mid_score: f64,
    pub floor_score: f64,
    /// Used when either side has no usable coordinates
    pub unknown_score: f64,
}

impl Default for LocationScoring {
    fn default() -> Self {
        Self {
            near_km: 5.0,
            mid_km: 15.0,
            max_km: 50.0,
            near_score: 1.0,
            mid_score: 0.8,
            floor_score: 0.1,
            unknown_score: 0.3,
        }
    }
}
