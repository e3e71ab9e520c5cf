//! # Lexis HTTP API Module
//!
//! The concept resource controller over axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (never authenticated)
//! - `GET /status` - Concept counts
//! - `GET /concept` - List, or search with `q`, `memberOf`, `answerTo`
//! - `POST /concept` - Create
//! - `GET /concept/{id}` - Retrieve by uuid or name
//! - `POST /concept/{id}` - Partial update
//! - `DELETE /concept/{id}` - Retire, or purge with `?purge=true`
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `LEXIS_CORS_ORIGINS`: Comma-separated allowed origins, or "*" (default: localhost only)
//! - `LEXIS_RATE_LIMIT`: Requests per second, overrides `[server] rate_limit`
//! - `LEXIS_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ApiError, DeleteParams, ErrorBody, ErrorDetail, HealthResponse, ListParams, RetrieveParams,
    StatusResponse,
};

use crate::config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use lexis_core::{LexisError, Locale, RequestContext, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Reads share the lock; lifecycle calls take it exclusively.
    pub session: Arc<RwLock<Session>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session, config: AppConfig) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            config: Arc::new(config),
        }
    }

    /// Request context from `Accept-Language`, else the configured locale.
    ///
    /// Only the first language tag is used; `en-GB` becomes `en_GB`.
    #[must_use]
    pub fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let mut ctx = self.config.default_context();
        let tag = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "*");
        if let Some(tag) = tag {
            ctx.locale = Locale::new(tag.replace('-', "_"));
        }
        ctx
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// Build the CORS layer from `LEXIS_CORS_ORIGINS`.
///
/// "*" allows everything, a comma-separated list allows those origins, and
/// an unset or unusable value restricts to localhost.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("LEXIS_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins (LEXIS_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: allowing origin {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins in LEXIS_CORS_ORIGINS, using localhost");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([
                        header::CONTENT_TYPE,
                        header::AUTHORIZATION,
                        header::ACCEPT_LANGUAGE,
                    ])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT_LANGUAGE,
        ])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if `LEXIS_API_KEY` is set)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env().unwrap_or(state.config.server.rate_limit);
    let body_limit = state.config.server.body_limit;

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/concept",
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(
            "/concept/{id}",
            get(handlers::retrieve_handler)
                .post(handlers::update_handler)
                .delete(handlers::delete_handler),
        );

    if get_api_key_from_env().is_some() {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    } else {
        tracing::warn!(
            "API key authentication DISABLED, set {} to enable it",
            API_KEY_ENV
        );
    }

    if rate_limit > 0 {
        tracing::info!("rate limiting enabled: {} requests/second", rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process stops.
pub async fn run_server(addr: &str, session: Session, config: AppConfig) -> Result<(), LexisError> {
    let router = create_router(AppState::new(session, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LexisError::Io(format!("bind {} failed: {}", addr, e)))?;

    tracing::info!("Lexis HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| LexisError::Io(format!("server error: {}", e)))
}
