/// Application state and router builder
///
/// Defines the shared application state and assembles the Axum router with
/// all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use userdesk_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer};

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; `Arc` keeps the clone
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Secret for session token operations
    pub fn token_secret(&self) -> &str {
        &self.config.auth.token_secret
    }
}

/// Builds the complete Axum router
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /login              # public
///     │   ├── POST /refresh            # public
///     │   └── GET  /status             # authenticated, no status gate
///     ├── /users/...                   # authenticated + status gate
///     └── /roles                       # authenticated + status gate
/// ```
///
/// # Middleware
///
/// Protected groups run bearer-token authentication first (loading the
/// actor's capability snapshot), then the session status gate, so a
/// deactivated user never reaches a handler. The status poll authenticates
/// but skips the gate, since it must answer 200 with `logout: true`.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth surface.
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // The status poll: authenticated, deliberately outside the status gate.
    let status_route = Router::new()
        .route("/status", get(routes::auth::check_status))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ));

    // User management resource (authentication + status gate).
    let user_routes = Router::new()
        .route("/", get(routes::users::index).post(routes::users::store))
        .route("/table", post(routes::users::table))
        .route(
            "/:id",
            get(routes::users::show)
                .put(routes::users::update)
                .delete(routes::users::destroy),
        )
        .route("/:id/edit", get(routes::users::edit))
        .route("/:id/toggle-status", patch(routes::users::toggle_status));

    let role_routes = Router::new().route("/", get(routes::roles::list_roles));

    // Layer order matters: the gate must see the Actor extension, so
    // authentication is the outermost of the two.
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/roles", role_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::status_gate::enforce_active_status,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes.merge(status_route))
        .merge(protected);

    let cors = build_cors(&state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS configuration: permissive in development, origin-listed otherwise
fn build_cors(state: &AppState) -> CorsLayer {
    if state.config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

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
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
