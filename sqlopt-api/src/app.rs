/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use sqlopt_api::{app::AppState, config::Config};
/// use sqlopt_shared::db::pool::DatabaseConfig;
/// use sqlopt_shared::llm::{OpenAiClient, OpenAiConfig};
/// use sqlopt_shared::store;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = store::connect(&DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let llm = OpenAiClient::new(OpenAiConfig {
///     api_key: config.openai.api_key.clone(),
///     ..Default::default()
/// })?;
///
/// let state = AppState::new(store, Arc::new(llm), config);
/// let app = sqlopt_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, post, put},
    Extension, Router,
};
use chrono::Duration;
use sqlopt_shared::auth::{
    authorization::{require_admin, AdminAllowlist},
    middleware::{session_auth_middleware, AuthContext},
    session::SessionStore,
};
use sqlopt_shared::llm::CompletionClient;
use sqlopt_shared::store::Store;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Completion client used by the optimizer
    pub llm: Arc<dyn CompletionClient>,

    /// Live login sessions
    pub sessions: SessionStore,

    /// Emails that are always admins
    pub allowlist: Arc<AdminAllowlist>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state with an empty session store
    ///
    /// Sessions live as long as their tokens (`SESSION_TTL_HOURS`).
    pub fn new(store: Arc<dyn Store>, llm: Arc<dyn CompletionClient>, config: Config) -> Self {
        Self {
            store,
            llm,
            sessions: SessionStore::with_ttl(Duration::hours(config.jwt.session_ttl_hours)),
            allowlist: Arc::new(AdminAllowlist::new(config.admin_emails.iter())),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/register, /auth/login  # public
///     ├── /auth/logout                 # session
///     ├── /me, /quota                  # session
///     ├── /optimizer/...               # session
///     ├── /nl/...                      # session
///     ├── /history/...                 # session
///     ├── /analytics/...               # admin
///     └── /users/...                   # admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication, then the admin check (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes; logout needs a session
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .merge(
            Router::new()
                .route("/logout", post(routes::auth::logout))
                .route_layer(from_fn_with_state(state.clone(), session_auth_layer)),
        );

    // Routes for any signed-in user
    let session_routes = Router::new()
        .route("/me", get(routes::home::dashboard))
        .route("/quota", get(routes::home::quota))
        .route("/optimizer/tasks", get(routes::optimizer::list_tasks))
        .route("/optimizer/format", post(routes::optimizer::format))
        .route("/optimizer/current", get(routes::optimizer::current_query))
        .route("/optimizer/analyze", post(routes::optimizer::analyze))
        .route("/optimizer/download", get(routes::optimizer::download))
        .route("/nl/samples", get(routes::nl::list_samples))
        .route(
            "/nl/schema",
            get(routes::nl::get_schema)
                .put(routes::nl::save_schema)
                .delete(routes::nl::delete_schema),
        )
        .route("/nl/generate", post(routes::nl::generate))
        .route("/nl/use", post(routes::nl::use_generated))
        .route("/nl/save", post(routes::nl::save_generated))
        .route("/nl/download", get(routes::nl::download))
        .route("/history", get(routes::history::list_history))
        .route("/history/favorites", get(routes::history::list_favorites))
        .route("/history/:id", delete(routes::history::delete_entry))
        .route("/history/:id/favorite", post(routes::history::toggle_favorite))
        .route("/history/:id/name", put(routes::history::rename_entry))
        .route("/history/:id/use", post(routes::history::use_entry))
        .route_layer(from_fn_with_state(state.clone(), session_auth_layer));

    // Admin-only routes; the session layer runs first
    let admin_routes = Router::new()
        .route("/analytics", get(routes::analytics::summary))
        .route("/analytics/activity", get(routes::analytics::recent_activity))
        .route("/analytics/top-users", get(routes::analytics::top_users))
        .route("/analytics/errors", get(routes::analytics::recent_errors))
        .route("/users", get(routes::users::list_users))
        .route("/users/regular", get(routes::users::list_regular_users))
        .route("/users/stats", get(routes::users::user_stats))
        .route("/users/:email", delete(routes::users::delete_user))
        .route("/users/:email/admin", post(routes::users::grant_admin))
        .route("/users/:email/password", put(routes::users::reset_password))
        .route_layer(from_fn(admin_layer))
        .route_layer(from_fn_with_state(state.clone(), session_auth_layer));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(session_routes)
        .merge(admin_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::RETRY_AFTER, header::CONTENT_DISPOSITION])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// Session authentication layer
///
/// Validates the bearer token against the live session store and injects
/// an `AuthContext` into request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    session_auth_middleware(state.config.jwt.secret.clone(), state.sessions.clone(), req, next)
        .await
        .map_err(ApiError::from)
}

/// Rejects non-admin sessions with 403
async fn admin_layer(
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    require_admin(&auth)?;
    Ok(next.run(req).await)
}
