//! Liveness and key-publication endpoints.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

/// JWK set holding the system's access-token verification key.
pub async fn jwks(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "keys": [state.sessions.public_jwk()] }))
}
