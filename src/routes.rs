//! # Router
//!
//! All endpoints and the layers that belong to them. The session layer is
//! added by the caller (`main` uses the SQLite store, tests an in-memory one)
//! and must wrap the whole router.

use crate::config::Config;
use crate::handlers::{auth, health::health_check, stats, track::track};
use crate::middleware::auth::require_auth;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Routes that need a signed-in session
    let protected = Router::new()
        .route("/stats", get(stats::summary))
        .route_layer(axum_middleware::from_fn(require_auth));

    let api = Router::new()
        .route("/track", post(track))
        // Registration flow (creating a new passkey)
        .route("/auth/register/options", post(auth::register_options))
        .route("/auth/register/verify", post(auth::register_verify))
        // Login flow (signing a challenge with an existing passkey)
        .route("/auth/login/options", post(auth::login_options))
        .route("/auth/login/verify", post(auth::login_verify))
        // Session management
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session_info))
        .merge(protected)
        .layer(cors);

    Router::new()
        .route("/", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browsers may call `/api/*` with cookies from the configured origins only.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
