//! Registered client applications.
//!
//! The resolved client ID is stored on the session and becomes the
//! `aud` claim of its tokens.

use std::collections::HashMap;

use url::Url;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Client ID of the built-in admin portal.
pub const ADMIN_PORTAL_CLIENT_ID: &str = "_authcore_admin_portal_";

/// Alias sent by legacy SDKs in place of an empty client ID.
const LEGACY_DEFAULT_CLIENT_ALIAS: &str = "authcore.io";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientApplication {
    pub id: String,
    pub name: String,
    pub app_domains: Vec<String>,
    pub allowed_callback_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ApplicationRegistry {
    apps: HashMap<String, ClientApplication>,
    default_client_id: String,
}

impl ApplicationRegistry {
    /// Load the configured applications plus the admin portal, whose
    /// domain and callback derive from `base_url`.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| AuthError::InvalidConfig(format!("invalid base_url: {e}")))?;
        let web = base
            .join("/web/")
            .map_err(|e| AuthError::InvalidConfig(format!("invalid base_url: {e}")))?;

        let mut apps: HashMap<String, ClientApplication> = config
            .applications
            .iter()
            .map(|(id, app)| {
                let id = id.to_lowercase();
                (
                    id.clone(),
                    ClientApplication {
                        id,
                        name: app.name.clone(),
                        app_domains: app.app_domains.clone(),
                        allowed_callback_urls: app.allowed_callback_urls.clone(),
                    },
                )
            })
            .collect();

        apps.insert(
            ADMIN_PORTAL_CLIENT_ID.into(),
            ClientApplication {
                id: ADMIN_PORTAL_CLIENT_ID.into(),
                name: "Authcore".into(),
                app_domains: base.host_str().map(str::to_string).into_iter().collect(),
                allowed_callback_urls: vec![web.to_string()],
            },
        );

        Ok(Self {
            apps,
            default_client_id: config.default_client_id.clone(),
        })
    }

    /// Resolve a client ID as presented by a caller.
    pub fn resolve(&self, client_id: &str) -> Result<&ClientApplication, AuthError> {
        let client_id = if client_id == LEGACY_DEFAULT_CLIENT_ALIAS {
            ""
        } else {
            client_id
        };
        if !client_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AuthError::UnknownClient(client_id.into()));
        }
        let client_id = if client_id.is_empty() {
            self.default_client_id.as_str()
        } else {
            client_id
        };
        self.apps
            .get(&client_id.to_lowercase())
            .ok_or_else(|| AuthError::UnknownClient(client_id.into()))
    }
}
