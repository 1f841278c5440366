//! Immutable key and registry context, built once at startup.

use chrono::Duration;

use crate::application::ApplicationRegistry;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::keys::{PublicJwk, SigningKey};
use crate::service_account::ServiceAccountRegistry;
use crate::token::TokenSettings;

/// Everything loaded from [`AuthConfig`] that request handling reads:
/// the system signing key, the service-account and client-application
/// registries, and token/session lifetimes.
///
/// Construction fails on any unparseable key; callers treat that as
/// fatal.
#[derive(Debug, Clone)]
pub struct AuthContext {
    signing_key: SigningKey,
    service_accounts: ServiceAccountRegistry,
    applications: ApplicationRegistry,
    token_settings: TokenSettings,
    session_ttl: Duration,
}

impl AuthContext {
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.access_token_private_key.trim().is_empty() {
            return Err(AuthError::InvalidKey(
                "access_token_private_key is not configured".into(),
            ));
        }
        let signing_key = SigningKey::from_pem(&config.access_token_private_key)?;
        let service_accounts = ServiceAccountRegistry::from_config(&config.service_accounts)?;
        let applications = ApplicationRegistry::from_config(config)?;

        Ok(Self {
            signing_key,
            service_accounts,
            applications,
            token_settings: TokenSettings {
                issuer: config.base_url.clone(),
                access_token_ttl: seconds(config.access_token_expires_in_secs),
            },
            session_ttl: seconds(config.session_expires_in_secs),
        })
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn public_jwk(&self) -> &PublicJwk {
        self.signing_key.verifying_key().jwk()
    }

    pub fn service_accounts(&self) -> &ServiceAccountRegistry {
        &self.service_accounts
    }

    pub fn applications(&self) -> &ApplicationRegistry {
        &self.applications
    }

    pub fn token_settings(&self) -> &TokenSettings {
        &self.token_settings
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

/// Lifetimes are capped at roughly a century so that `now + ttl` stays
/// representable.
const MAX_LIFETIME_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn seconds(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_LIFETIME_SECS) as i64)
}
