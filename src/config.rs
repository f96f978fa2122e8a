use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::{LocationScoring, ScoringWeights};
use crate::services::{PoolOptions, SupabaseTables};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub service_key: String,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    #[serde(default = "default_skills_table")]
    pub skills_table: String,
    /// Profiles requested per page when filling the candidate pool
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_profiles_table() -> String { "profiles".to_string() }
fn default_skills_table() -> String { "skills".to_string() }
fn default_page_size() -> usize { crate::services::supabase::DEFAULT_PAGE_SIZE }

impl SupabaseSettings {
    pub fn tables(&self) -> SupabaseTables {
        SupabaseTables {
            profiles: self.profiles_table.clone(),
            skills: self.skills_table.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

impl DatabaseSettings {
    pub fn pool_options(&self) -> PoolOptions {
        let defaults = PoolOptions::default();
        PoolOptions {
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            min_connections: self.min_connections.unwrap_or(defaults.min_connections),
            acquire_timeout: self
                .acquire_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: self
                .idle_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            redis_url: default_redis_url(),
            ttl_secs: default_cache_ttl(),
            l1_cache_size: default_l1_size(),
        }
    }
}

fn default_true() -> bool { true }
fn default_redis_url() -> String { "redis://127.0.0.1:6379".to_string() }
fn default_cache_ttl() -> u64 { 120 }
fn default_l1_size() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            candidate_pool_size: default_candidate_pool_size(),
        }
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_candidate_pool_size() -> usize { 500 }

impl MatchingSettings {
    /// Display limit for a request, capped at `max_limit`
    pub fn resolve_limit(&self, requested: Option<u16>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1)) as usize
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

impl ScoringSettings {
    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            skill: self.weights.skill,
            location: self.weights.location,
        }
    }

    /// Weights must be non-negative and sum to 1; distance bands must be
    /// strictly increasing and every score must lie in 0-1
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        if !(w.skill.is_finite() && w.location.is_finite()) || w.skill < 0.0 || w.location < 0.0 {
            return Err(invalid(format!(
                "scoring.weights must be non-negative, got skill={} location={}",
                w.skill, w.location
            )));
        }
        if (w.skill + w.location - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!(
                "scoring.weights must sum to 1, got {}",
                w.skill + w.location
            )));
        }

        let l = &self.location;
        if !(0.0 <= l.near_km && l.near_km < l.mid_km && l.mid_km < l.max_km && l.max_km.is_finite()) {
            return Err(invalid(format!(
                "scoring.location needs 0 <= near_km < mid_km < max_km, got {} / {} / {}",
                l.near_km, l.mid_km, l.max_km
            )));
        }
        let scores = [l.near_score, l.mid_score, l.floor_score, l.unknown_score];
        if scores.iter().any(|s| !(0.0..=1.0).contains(s)) {
            return Err(invalid("scoring.location scores must lie between 0 and 1".to_string()));
        }

        Ok(())
    }

    pub fn location(&self) -> LocationScoring {
        let l = &self.location;
        LocationScoring {
            near_km: l.near_km,
            mid_km: l.mid_km,
            max_km: l.max_km,
            near_score: l.near_score,
            mid_score: l.mid_score,
            floor_score: l.floor_score,
            unknown_score: l.unknown_score,
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn invalid(message: String) -> ConfigError {
    ConfigError::Message(message)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_skill_weight")]
    pub skill: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            skill: default_skill_weight(),
            location: default_location_weight(),
        }
    }
}

fn default_skill_weight() -> f64 { ScoringWeights::default().skill }
fn default_location_weight() -> f64 { ScoringWeights::default().location }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub near_km: f64,
    pub mid_km: f64,
    pub max_km: f64,
    pub near_score: f64,
    pub mid_score: f64,
    pub floor_score: f64,
    pub unknown_score: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        let d = LocationScoring::default();
        Self {
            near_km: d.near_km,
            mid_km: d.mid_km,
            max_km: d.max_km,
            near_score: d.near_score,
            mid_score: d.mid_score,
            floor_score: d.floor_score,
            unknown_score: d.unknown_score,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SKILLSWAP__)
    /// 5. DATABASE_URL, SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SKILLSWAP__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        finish(settings)
    }

    /// Load configuration from a custom path
    ///
    /// Environment variables apply on top, exactly as for [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        finish(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()
    }
}

fn finish(settings: Config) -> Result<Settings, ConfigError> {
    finish_with(settings, |var| std::env::var(var).ok())
}

fn finish_with<F>(settings: Config, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let settings: Settings = apply_overrides(settings, lookup)?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

fn environment() -> Environment {
    Environment::with_prefix("SKILLSWAP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional Supabase/Postgres variables on top of the layered config
fn apply_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    let overrides = [
        ("database.url", "DATABASE_URL"),
        ("supabase.url", "SUPABASE_URL"),
        ("supabase.service_key", "SUPABASE_SERVICE_ROLE_KEY"),
    ];
    for (key, var) in overrides {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
