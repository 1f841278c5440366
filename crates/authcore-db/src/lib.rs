//! Authcore Database: SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Numeric record IDs ([`next_id`])
//! - Repository implementations of the `authcore-core` traits

mod connection;
mod error;
pub mod repository;
mod schema;
mod sequence;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
pub use sequence::next_id;
