//! Router wiring.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::middleware;
use crate::routes;
use crate::state::AppState;

/// Build the full HTTP router.
///
/// Authentication wraps every request; enforcement runs only on matched
/// routes, keyed by the route template.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/.well-known/jwks.json", get(routes::health::jwks))
        .route("/api/v2/tokens", post(routes::tokens::create_access_token))
        .merge(routes::sessions::router())
        .route_layer(from_fn_with_state(state.clone(), middleware::authorize))
        .layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .with_state(state)
}
