use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::config::MatchingSettings;
use crate::core::{filters::partition_skills, Matcher};
use crate::models::{
    ErrorResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, MatchCandidate, MatchEvent,
    MatchEventType, RankMatchesRequest, RecordEventRequest, RecordEventResponse, ScoredMatch, Skill,
};
use crate::services::{CacheKey, CacheManager, PostgresClient, SupabaseClient, SupabaseError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub supabase: Arc<SupabaseClient>,
    pub postgres: Arc<PostgresClient>,
    /// `None` when Redis was unreachable at startup
    pub cache: Option<Arc<CacheManager>>,
    pub matcher: Matcher,
    pub matching: MatchingSettings,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/rank", web::post().to(rank_matches))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/event", web::post().to(record_event))
        .route("/matches/seen", web::get().to(get_seen))
        .route("/matches/seen", web::delete().to(clear_seen))
        .route("/matches/stats", web::get().to(get_stats));
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: String,
}

fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

fn supabase_error_response(context: &str, err: &SupabaseError) -> HttpResponse {
    match err {
        SupabaseError::NotFound(message) => error_response(StatusCode::NOT_FOUND, "User not found", message),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, context, err),
    }
}

/// Attach explanations to ranked candidates
fn scored_matches(
    matcher: &Matcher,
    ranked: Vec<MatchCandidate>,
    requester_sought: &[Skill],
    requester_offered: &[Skill],
) -> Vec<ScoredMatch> {
    ranked
        .into_iter()
        .map(|candidate| {
            let explanation = matcher.explain(&candidate, requester_sought, requester_offered);
            ScoredMatch::new(candidate, explanation)
        })
        .collect()
}

/// Apply per-request exclusions and the display limit to a full ranking
fn request_view(mut full: FindMatchesResponse, exclude_ids: &[String], limit: usize) -> FindMatchesResponse {
    if !exclude_ids.is_empty() {
        full.matches.retain(|m| !exclude_ids.contains(&m.user_id));
    }
    full.matches.truncate(limit);
    full
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);

    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank caller-supplied candidates
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "requester": {"id": "u1", "latitude": 52.52, "longitude": 13.40},
///   "soughtSkills": [{"id": "s1", "user_id": "u1", "name": "Guitar", "category": "music", "is_offering": false}],
///   "offeredSkills": [],
///   "candidates": [{"user": {"id": "u2"}, "offered_skills": [], "sought_skills": []}],
///   "limit": 10
/// }
/// ```
async fn rank_matches(
    state: web::Data<AppState>,
    req: web::Json<RankMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for rank request: {}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let req = req.into_inner();
    let limit = state.matching.resolve_limit(req.limit);

    let ranked = state
        .matcher
        .find_matches(&req.requester, &req.sought_skills, &req.candidates);

    let response = request_view(
        FindMatchesResponse {
            matches: scored_matches(&state.matcher, ranked, &req.sought_skills, &req.offered_skills),
            total_candidates: req.candidates.len(),
        },
        &[],
        limit,
    );

    tracing::debug!(
        "Ranked {} of {} supplied candidates for {}",
        response.matches.len(),
        response.total_candidates,
        req.requester.id
    );

    HttpResponse::Ok().json(response)
}

/// Find matches for a stored user
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 20,
///   "excludeUserIds": ["string"]
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find request: {}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let user_id = &req.user_id;
    let limit = state.matching.resolve_limit(req.limit);
    let cache_key = CacheKey::matches(user_id);

    tracing::info!("Finding matches for user: {}, limit: {}", user_id, limit);

    if let Some(cache) = &state.cache {
        match cache.get::<FindMatchesResponse>(&cache_key).await {
            Ok(cached) => {
                tracing::debug!("Serving cached matches for {}", user_id);
                return HttpResponse::Ok().json(request_view(cached, &req.exclude_user_ids, limit));
            }
            Err(crate::services::CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", user_id, e),
        }
    }

    let profile = match state.supabase.get_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return supabase_error_response("Failed to fetch user profile", &e);
        }
    };

    let (offered, sought) = match state.supabase.get_skills(user_id).await {
        Ok(skills) => partition_skills(skills),
        Err(e) => {
            tracing::error!("Failed to fetch skills for {}: {}", user_id, e);
            return supabase_error_response("Failed to fetch skills", &e);
        }
    };

    // Hiding acted-on candidates is best-effort
    let seen_ids = match state.postgres.get_seen_ids(user_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("Failed to fetch seen candidates for {}, proceeding without filtering: {}", user_id, e);
            vec![]
        }
    };

    let candidates = match state
        .supabase
        .query_candidates(user_id, &seen_ids, state.matching.candidate_pool_size)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to query candidates for {}: {}", user_id, e);
            return supabase_error_response("Failed to query candidates", &e);
        }
    };

    let ranked = state.matcher.find_matches(&profile, &sought, &candidates);

    let full = FindMatchesResponse {
        matches: scored_matches(&state.matcher, ranked, &sought, &offered),
        total_candidates: candidates.len(),
    };

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set(&cache_key, &full).await {
            tracing::warn!("Failed to cache matches for {}: {}", user_id, e);
        }
    }

    let response = request_view(full, &req.exclude_user_ids, limit);

    tracing::info!(
        "Returning {} matches for user {} (from {} candidates)",
        response.matches.len(),
        user_id,
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

async fn invalidate_matches(state: &AppState, user_id: &str) {
    if let Some(cache) = &state.cache {
        if let Err(e) = cache.delete(&CacheKey::matches(user_id)).await {
            tracing::warn!("Failed to invalidate cache for {}: {}", user_id, e);
        }
    }
}

/// Record an action on a recommendation
///
/// POST /api/v1/matches/event
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "targetUserId": "string",
///   "eventType": "viewed|dismissed|contacted|trade_proposed"
/// }
/// ```
async fn record_event(
    state: web::Data<AppState>,
    req: web::Json<RecordEventRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let Some(event_type) = MatchEventType::parse(&req.event_type) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid event type",
            "Event type must be one of: viewed, dismissed, contacted, trade_proposed",
        );
    };

    let event = MatchEvent {
        user_id: req.user_id.clone(),
        target_user_id: req.target_user_id.clone(),
        event_type,
        created_at: chrono::Utc::now(),
    };

    let event_id = match state.postgres.record_event(&event).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to record event: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to record event", e);
        }
    };

    invalidate_matches(&state, &event.user_id).await;

    HttpResponse::Ok().json(RecordEventResponse {
        success: true,
        event_id,
    })
}

/// Candidates a user already acted on
///
/// GET /api/v1/matches/seen?userId={userId}
async fn get_seen(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    match state.postgres.get_seen_ids(&query.user_id).await {
        Ok(seen_ids) => HttpResponse::Ok().json(serde_json::json!({
            "userId": query.user_id,
            "seenUserIds": seen_ids,
            "count": seen_ids.len(),
        })),
        Err(e) => {
            tracing::error!("Failed to fetch seen candidates for {}: {}", query.user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch seen candidates", e)
        }
    }
}

/// Reset a user's recommendations
///
/// DELETE /api/v1/matches/seen?userId={userId}
async fn clear_seen(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    match state.postgres.clear_events(&query.user_id).await {
        Ok(cleared) => {
            invalidate_matches(&state, &query.user_id).await;
            HttpResponse::Ok().json(serde_json::json!({
                "userId": query.user_id,
                "cleared": cleared,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to clear events for {}: {}", query.user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear seen candidates", e)
        }
    }
}

/// GET /api/v1/matches/stats?userId={userId}
async fn get_stats(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    match state.postgres.get_event_stats(&query.user_id).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            tracing::error!("Failed to fetch event stats for {}: {}", query.user_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch event stats", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, score: f64) -> ScoredMatch {
        ScoredMatch {
            user_id: id.to_string(),
            score,
            distance_km: None,
            availability: None,
            offered_skills: vec![],
            sought_skills: vec![],
            matched_skills: vec![],
            reciprocal_skills: vec![],
        }
    }

    #[test]
    fn test_request_view_excludes_then_truncates() {
        let full = FindMatchesResponse {
            matches: vec![scored("a", 0.9), scored("b", 0.8), scored("c", 0.7), scored("d", 0.6)],
            total_candidates: 4,
        };

        let view = request_view(full, &["b".to_string()], 2);

        let ids: Vec<_> = view.matches.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(view.total_candidates, 4);
    }

    #[test]
    fn test_cached_ranking_serves_each_request_view() {
        let full = FindMatchesResponse {
            matches: vec![scored("a", 0.9), scored("b", 0.8), scored("c", 0.7)],
            total_candidates: 3,
        };
        // Same JSON round trip the cache performs
        let cached: FindMatchesResponse =
            serde_json::from_str(&serde_json::to_string(&full).unwrap()).unwrap();

        let first = request_view(cached.clone(), &[], 1);
        let second = request_view(cached, &["a".to_string()], 5);

        assert_eq!(first.matches.len(), 1);
        assert_eq!(first.matches[0].user_id, "a");
        let ids: Vec<_> = second.matches.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_event_response_carries_row_id() {
        let json = serde_json::to_value(RecordEventResponse { success: true, event_id: 42 }).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "eventId": 42}));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = supabase_error_response("ctx", &SupabaseError::NotFound("u1".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = supabase_error_response("ctx", &SupabaseError::Unauthorized);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
