//! Authcore Server: HTTP transport over the session store and enforcer.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::router;
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
