/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// The state is assembled once at process start: pool, cache client, and
/// mailer are constructed from config and injected into the domain
/// services, which live until shutdown. Handlers only ever see the state;
/// nothing reads the environment after startup.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tandem_shared::cache::CacheClient;
use tandem_shared::notify::{Mailer, Notifier};
use tandem_shared::services::{MatchManager, OnboardingService, RematchService};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// services clone cheaply (pools and clients are internally shared).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Cache client (possibly disabled)
    pub cache: CacheClient,

    /// Application configuration
    pub config: Arc<Config>,

    /// Match creation and dissolution
    pub matching: MatchManager,

    /// Rematch request workflow
    pub rematch: RematchService,

    /// Invitations and onboarding
    pub onboarding: OnboardingService,
}

impl AppState {
    /// Wires the domain services from their shared dependencies
    pub fn new(db: PgPool, cache: CacheClient, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let notifier = Notifier::new(mailer, db.clone());

        let matching = MatchManager::new(db.clone(), cache.clone(), notifier.clone());
        let rematch = RematchService::new(db.clone(), cache.clone(), notifier.clone());
        let onboarding = OnboardingService::new(
            db.clone(),
            cache.clone(),
            notifier,
            config.api.signup_base_url.clone(),
        );

        Self {
            db,
            cache,
            config: Arc::new(config),
            matching,
            rematch,
            onboarding,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /v1/
///     ├── POST /invitations                # Issue invitation (admin)
///     ├── POST /invitations/redeem         # Redeem token (public)
///     ├── GET  /members                    # List by status (admin)
///     ├── GET  /members/:id                # Profile (cached)
///     ├── DELETE /members/:id              # Cascade delete (admin)
///     ├── POST /members/:id/status         # Status override (admin)
///     ├── POST /members/:id/onboarding     # Complete onboarding
///     ├── PUT  /members/:id/goal/progress  # Update goal progress
///     ├── GET  /members/:id/match          # Current match
///     ├── POST /matches                    # Create match (admin)
///     ├── POST /matches/:id/dissolve       # Dissolve match (admin)
///     ├── GET  /matches/:id                # Match with roster
///     ├── POST /rematch-requests           # Submit request
///     ├── GET  /rematch-requests           # Pending queue (admin)
///     └── POST /rematch-requests/:id/resolve  # Approve/deny (admin)
/// ```
///
/// Admin routes sit behind a static bearer-token layer; the rest of the
/// identity story (member sessions) lives outside this service.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new()
        .route(
            "/invitations/redeem",
            post(routes::invitations::redeem_invitation),
        )
        .route("/members/:id", get(routes::members::get_member))
        .route(
            "/members/:id/onboarding",
            post(routes::members::complete_onboarding),
        )
        .route(
            "/members/:id/goal/progress",
            put(routes::members::update_goal_progress),
        )
        .route("/members/:id/match", get(routes::members::current_match))
        .route("/matches/:id", get(routes::matches::get_match))
        .route(
            "/rematch-requests",
            post(routes::rematch_requests::submit_request),
        );

    let admin_routes = Router::new()
        .route("/invitations", post(routes::invitations::create_invitation))
        .route("/members", get(routes::members::list_members))
        .route("/members/:id", delete(routes::members::delete_member))
        .route("/members/:id/status", post(routes::members::set_status))
        .route("/matches", post(routes::matches::create_match))
        .route(
            "/matches/:id/dissolve",
            post(routes::matches::dissolve_match),
        )
        .route(
            "/rematch-requests",
            get(routes::rematch_requests::list_pending),
        )
        .route(
            "/rematch-requests/:id/resolve",
            post(routes::rematch_requests::resolve_request),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            admin_auth_layer,
        ));

    let v1_routes = public_routes.merge(admin_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Admin bearer-token middleware
///
/// The identity collaborator reduced to its boundary: upstream has already
/// resolved *who* the admin is; this layer only checks the shared token.
/// With no token configured the routes are open (development mode).
async fn admin_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = &state.config.api.admin_token else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    if token != expected {
        return Err(ApiError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(next.run(req).await)
}
