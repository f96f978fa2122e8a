use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::filters::partition_skills;
use crate::models::{MatchCandidate, Skill, UserProfile};

const PROFILE_COLUMNS: &str = "id,latitude,longitude,availability";
const SKILL_COLUMNS: &str = "id,user_id,name,category,is_offering";

/// Profiles fetched per request while filling the candidate pool
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Users per `user_id=in.(...)` skill lookup, keeps URLs short
const SKILL_LOOKUP_CHUNK: usize = 100;

/// Errors that can occur when interacting with Supabase
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Table names in the Supabase project
#[derive(Debug, Clone)]
pub struct SupabaseTables {
    pub profiles: String,
    pub skills: String,
}

impl Default for SupabaseTables {
    fn default() -> Self {
        Self {
            profiles: "profiles".to_string(),
            skills: "skills".to_string(),
        }
    }
}

/// Supabase REST (PostgREST) client
///
/// Read-only access to the product tables the matcher needs:
/// - profiles (id, coordinates, availability)
/// - skills (offered and sought, per user)
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    client: Client,
    tables: SupabaseTables,
    page_size: usize,
}

impl SupabaseClient {
    /// Create a new Supabase client
    pub fn new(base_url: String, api_key: String, tables: SupabaseTables) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
            tables,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override how many profiles are requested per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn table_url(&self, table: &str, columns: &str, filters: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}/rest/v1/{}?select={}",
            self.base_url.trim_end_matches('/'),
            table,
            columns
        );

        for (column, filter) in filters {
            url.push('&');
            url.push_str(column);
            url.push('=');
            url.push_str(&urlencoding::encode(filter));
        }

        url
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, SupabaseError> {
        tracing::debug!("Fetching rows from: {}", url);

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Supabase request failed: {} - {}", status, body);
            return Err(SupabaseError::ApiError(format!("{}: {}", status, body)));
        }

        let json: Value = response.json().await?;
        if !json.is_array() {
            return Err(SupabaseError::InvalidResponse("Expected a JSON array of rows".into()));
        }

        serde_json::from_value(json)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse rows: {}", e)))
    }

    /// Get a single profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, SupabaseError> {
        let url = self.table_url(
            &self.tables.profiles,
            PROFILE_COLUMNS,
            &[("id", format!("eq.{}", user_id)), ("limit", "1".to_string())],
        );

        self.fetch_rows::<UserProfile>(&url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NotFound(format!("Profile not found for user {}", user_id)))
    }

    /// Get all skills (offered and sought) owned by a user
    pub async fn get_skills(&self, user_id: &str) -> Result<Vec<Skill>, SupabaseError> {
        let url = self.table_url(
            &self.tables.skills,
            SKILL_COLUMNS,
            &[("user_id", format!("eq.{}", user_id))],
        );

        self.fetch_rows(&url).await
    }

    /// Load the candidate pool for a user
    ///
    /// Pages through the profiles table until `pool_size` profiles other
    /// than the user and `exclude_ids` are collected or the table runs out.
    /// Exclusions are applied here rather than in the query so the request
    /// URL does not grow with the user's history. Each profile comes back
    /// with its offered and sought skills joined in.
    pub async fn query_candidates(
        &self,
        user_id: &str,
        exclude_ids: &[String],
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>, SupabaseError> {
        let excluded: HashSet<&str> = exclude_ids
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(user_id))
            .collect();

        let mut profiles: Vec<UserProfile> = Vec::new();
        let mut offset = 0;

        while profiles.len() < pool_size {
            let page = self.profile_page(user_id, offset).await?;
            let fetched = page.len();
            let remaining = pool_size - profiles.len();

            profiles.extend(
                page.into_iter()
                    .filter(|p| !excluded.contains(p.id.as_str()))
                    .take(remaining),
            );

            if fetched < self.page_size {
                break;
            }
            offset += fetched;
        }

        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let mut skills_by_user: HashMap<String, Vec<Skill>> = HashMap::new();
        for skill in self.skills_for(&profiles).await? {
            skills_by_user.entry(skill.user_id.clone()).or_default().push(skill);
        }

        let candidates: Vec<MatchCandidate> = profiles
            .into_iter()
            .map(|profile| {
                let (offered, sought) =
                    partition_skills(skills_by_user.remove(&profile.id).unwrap_or_default());
                MatchCandidate::new(profile, offered, sought)
            })
            .collect();

        tracing::debug!(
            "Loaded {} candidates for {} ({} excluded ids)",
            candidates.len(),
            user_id,
            exclude_ids.len()
        );

        Ok(candidates)
    }

    async fn profile_page(&self, user_id: &str, offset: usize) -> Result<Vec<UserProfile>, SupabaseError> {
        let url = self.table_url(
            &self.tables.profiles,
            PROFILE_COLUMNS,
            &[
                ("id", format!("neq.{}", user_id)),
                ("order", "id.asc".to_string()),
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ],
        );

        self.fetch_rows(&url).await
    }

    async fn skills_for(&self, profiles: &[UserProfile]) -> Result<Vec<Skill>, SupabaseError> {
        let ids: Vec<String> = profiles.iter().map(|p| p.id.clone()).collect();
        let mut skills = Vec::new();

        for chunk in ids.chunks(SKILL_LOOKUP_CHUNK) {
            let url = self.table_url(
                &self.tables.skills,
                SKILL_COLUMNS,
                &[("user_id", format!("in.({})", quoted_list(chunk)))],
            );
            skills.extend(self.fetch_rows::<Skill>(&url).await?);
        }

        Ok(skills)
    }
}

fn quoted_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("\"{}\"", id.replace('"', "")))
        .collect::<Vec<_>>()
        .join(",")
}
