//! Role resolution and authorization decisions.
//!
//! Users hold roles through database assignments, service accounts through
//! static configuration. [`RoleGraph`] answers inheritance questions over
//! both, and [`Enforcer`] feeds the expanded subject into casbin's
//! `(sub, obj, act)` matcher.

pub mod enforcer;
pub mod policy;
pub mod resolver;
pub mod role_graph;

pub use enforcer::{Decision, Enforcer};
pub use policy::{PolicyConfig, PolicyRule, PolicySource};
pub use resolver::RoleResolver;
pub use role_graph::{MAX_HIERARCHY_LEVEL, RoleGraph};

pub(crate) fn policy_error(err: casbin::Error) -> authcore_core::AuthcoreError {
    authcore_core::AuthcoreError::Policy(err.to_string())
}
