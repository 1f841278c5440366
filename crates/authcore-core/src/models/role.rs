//! Role domain model.
//!
//! Role-to-permission mapping and role inheritance live in the policy
//! rule table; these records only carry user assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// System roles cannot be deleted.
    pub is_system_role: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub is_system_role: bool,
}
