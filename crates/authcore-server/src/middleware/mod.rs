//! Request middleware: access-token authentication and policy enforcement.

pub mod auth;
pub mod enforce;

pub use auth::{CurrentSession, CurrentUser, authenticate};
pub use enforce::authorize;
