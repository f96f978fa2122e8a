use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use skillswap_match::config::Settings;
use skillswap_match::core::Matcher;
use skillswap_match::routes::{self, matches::AppState};
use skillswap_match::services::{CacheManager, PostgresClient, SupabaseClient};
use skillswap_match::telemetry;
use std::sync::Arc;
use tracing::{info, warn, error};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| startup_error("Configuration error", e))?;

    telemetry::init(&settings.logging);

    info!("Starting SkillSwap matching service...");

    let supabase = Arc::new(
        SupabaseClient::new(
            settings.supabase.url.clone(),
            settings.supabase.service_key.clone(),
            settings.supabase.tables(),
        )
        .map_err(|e| startup_error("Supabase client error", e))?
        .with_page_size(settings.supabase.page_size),
    );

    info!("Supabase client initialized ({})", settings.supabase.url);

    let pool_options = settings.database.pool_options();
    let postgres = Arc::new(
        PostgresClient::connect(&settings.database.url, pool_options)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                startup_error("PostgreSQL connection error", e)
            })?,
    );

    info!("PostgreSQL client initialized (max: {} connections)", pool_options.max_connections);

    // The service works without Redis; results are simply recomputed
    let cache = if settings.cache.enabled {
        match CacheManager::new(
            &settings.cache.redis_url,
            settings.cache.l1_cache_size,
            settings.cache.ttl_secs,
        )
        .await
        {
            Ok(c) => {
                info!(
                    "Cache manager initialized (L1: {} entries, TTL: {}s)",
                    settings.cache.l1_cache_size, settings.cache.ttl_secs
                );
                Some(Arc::new(c))
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running without cache", e);
                None
            }
        }
    } else {
        info!("Caching disabled by configuration");
        None
    };

    let weights = settings.scoring.weights();
    let location = settings.scoring.location();
    let matcher = Matcher::new(weights, location);

    info!("Matcher initialized with weights: {:?}, location: {:?}", weights, location);

    let app_state = AppState {
        supabase,
        postgres,
        cache,
        matcher,
        matching: settings.matching.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
