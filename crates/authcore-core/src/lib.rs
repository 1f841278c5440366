//! Authcore Core: domain models, the subject identity variant,
//! request context and repository traits shared across all crates.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;
pub mod subject;

pub use context::RequestContext;
pub use error::{AuthcoreError, AuthcoreResult, ErrorKind};
pub use subject::Subject;
