//! Statically configured machine identities.

use std::collections::{BTreeMap, HashMap};

use authcore_core::Subject;
use tracing::info;

use crate::config::ServiceAccountConfig;
use crate::error::AuthError;
use crate::keys::VerifyingKey;

/// A machine identity. Its public key verifies the tokens it issues
/// for itself.
#[derive(Debug, Clone)]
pub struct ServiceAccount {
    id: String,
    roles: Vec<String>,
    key: VerifyingKey,
}

impl ServiceAccount {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn subject(&self) -> Subject {
        Subject::ServiceAccount(self.id.clone())
    }

    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }
}

/// Read-only registry of service accounts, keyed by lower-cased ID.
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountRegistry {
    accounts: BTreeMap<String, ServiceAccount>,
}

impl ServiceAccountRegistry {
    /// Parse every configured account. Any unparseable public key fails
    /// the whole load.
    pub fn from_config(config: &HashMap<String, ServiceAccountConfig>) -> Result<Self, AuthError> {
        let mut accounts = BTreeMap::new();
        for (id, entry) in config {
            let id = id.to_lowercase();
            let key = VerifyingKey::from_pem(&entry.public_key).map_err(|e| {
                AuthError::InvalidKey(format!("service account {id}: {e}"))
            })?;
            info!(id = %id, kid = %key.kid(), roles = ?entry.roles, "add service account");
            accounts.insert(
                id.clone(),
                ServiceAccount {
                    id,
                    roles: entry.roles.clone(),
                    key,
                },
            );
        }
        Ok(Self { accounts })
    }

    pub fn get(&self, id: &str) -> Option<&ServiceAccount> {
        self.accounts.get(&id.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceAccount> {
        self.accounts.values()
    }

    /// Accounts statically granted `role`.
    pub fn with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a ServiceAccount> {
        self.accounts.values().filter(move |a| a.has_role(role))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
