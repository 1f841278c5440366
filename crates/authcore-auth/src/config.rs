//! Authentication configuration.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Configuration for the session store and token codec.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Public base URL of the service; used as the token `iss` claim.
    pub base_url: String,
    /// PEM-encoded P-256 private key (PKCS#8 or SEC1) for token signing.
    pub access_token_private_key: String,
    /// Access token lifetime in seconds (default: 28_800 = 8 hours).
    pub access_token_expires_in_secs: u64,
    /// Session lifetime in seconds, renewed on every refresh
    /// (default: 2_592_000 = 30 days).
    pub session_expires_in_secs: u64,
    /// Client ID used when a session is created without one.
    pub default_client_id: String,
    /// Registered client applications, keyed by client ID.
    pub applications: HashMap<String, ApplicationConfig>,
    /// Statically configured machine identities, keyed by account ID.
    pub service_accounts: HashMap<String, ServiceAccountConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "https://authcore.localhost/".into(),
            access_token_private_key: String::new(),
            access_token_expires_in_secs: 28_800,
            session_expires_in_secs: 2_592_000,
            default_client_id: String::new(),
            applications: HashMap::new(),
            service_accounts: HashMap::new(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("base_url", &self.base_url)
            .field("access_token_private_key", &"<redacted>")
            .field(
                "access_token_expires_in_secs",
                &self.access_token_expires_in_secs,
            )
            .field("session_expires_in_secs", &self.session_expires_in_secs)
            .field("default_client_id", &self.default_client_id)
            .field("applications", &self.applications)
            .field("service_accounts", &self.service_accounts)
            .finish()
    }
}

/// A registered client application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub app_domains: Vec<String>,
    pub allowed_callback_urls: Vec<String>,
}

/// A machine identity: its token-verification key and granted roles.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceAccountConfig {
    /// PEM-encoded P-256 public key.
    pub public_key: String,
    pub roles: Vec<String>,
}
