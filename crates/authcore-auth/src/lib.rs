//! Authcore Auth: signing keys, access/ID token codec, service-account
//! and client-application registries, and the session store.

pub mod application;
pub mod config;
pub mod context;
pub mod error;
pub mod keys;
pub mod service_account;
pub mod store;
pub mod token;
pub mod user_agent;

pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use store::{CreateSessionInput, SessionStore};
pub use token::{AccessToken, VerifiedToken};
