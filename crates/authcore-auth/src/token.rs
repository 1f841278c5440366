//! ES256 access/ID token minting and verification, and opaque refresh
//! token generation.
//!
//! Verification has two trust paths. Tokens whose `iss` carries the
//! service-account prefix are self-issued by a machine and checked
//! against that account's registered key. All other tokens must name
//! the system key in their `kid` header and are checked against it.

use authcore_core::models::parse_public_id;
use authcore_core::models::user::User;
use authcore_core::subject::SERVICE_ACCOUNT_PREFIX;
use authcore_core::{AuthcoreResult, Subject};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::keys::{SigningKey, VerifyingKey};
use crate::service_account::ServiceAccountRegistry;

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub iss: String,
    /// Defaulted so that a missing `sub` surfaces as a missing required
    /// claim rather than a decoding failure.
    #[serde(default)]
    pub sub: String,
    /// Session ID. Absent on service-account tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Client ID the session belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// ID token claims: the access token claims plus non-sensitive profile
/// data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(flatten)]
    pub base: AccessTokenClaims,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub phone_number: String,
    pub phone_number_verified: bool,
    pub preferred_username: String,
}

/// Profile data embedded in an ID token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdTokenProfile {
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub phone_number: String,
    pub phone_number_verified: bool,
    pub preferred_username: String,
}

impl From<&User> for IdTokenProfile {
    fn from(user: &User) -> Self {
        Self {
            name: user.display_name(),
            email: user.email.clone().unwrap_or_default(),
            email_verified: user.email_verified_at.is_some(),
            phone_number: user.phone.clone().unwrap_or_default(),
            phone_number_verified: user.phone_verified_at.is_some(),
            preferred_username: user.username.clone().unwrap_or_default(),
        }
    }
}

/// A freshly minted token bundle. Never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub id_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Issuer and lifetime applied to minted tokens.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub access_token_ttl: Duration,
}

/// The identity asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// `sub` claim: a user public ID or `serviceaccount:<id>`.
    pub sub: String,
    /// `sid` claim; empty for machine tokens.
    pub sid: String,
}

impl VerifiedToken {
    pub fn subject(&self) -> AuthcoreResult<Subject> {
        if self.sub.starts_with(SERVICE_ACCOUNT_PREFIX) {
            self.sub.parse()
        } else {
            parse_public_id("user", &self.sub).map(Subject::User)
        }
    }

    pub fn session_id(&self) -> AuthcoreResult<Option<i64>> {
        if self.sid.is_empty() {
            Ok(None)
        } else {
            parse_public_id("session", &self.sid).map(Some)
        }
    }
}

fn es256_header(key: &SigningKey) -> Header {
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(key.kid().to_string());
    header
}

fn sign<T: Serialize>(key: &SigningKey, claims: &T) -> Result<String, AuthError> {
    jsonwebtoken::encode(&es256_header(key), claims, key.encoding_key())
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Mint an access token, and an ID token when a profile is supplied.
pub fn mint_access_token(
    key: &SigningKey,
    settings: &TokenSettings,
    subject: &str,
    session_id: &str,
    audience: &str,
    profile: Option<&IdTokenProfile>,
) -> Result<AccessToken, AuthError> {
    let issued_at = Utc::now();
    let claims = AccessTokenClaims {
        iat: issued_at.timestamp(),
        exp: (issued_at + settings.access_token_ttl).timestamp(),
        iss: settings.issuer.clone(),
        sub: subject.to_string(),
        sid: Some(session_id.to_string()),
        aud: Some(audience.to_string()),
    };

    let access_token = sign(key, &claims)?;
    let id_token = profile
        .map(|profile| {
            sign(
                key,
                &IdTokenClaims {
                    base: claims.clone(),
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    email_verified: profile.email_verified,
                    phone_number: profile.phone_number.clone(),
                    phone_number_verified: profile.phone_number_verified,
                    preferred_username: profile.preferred_username.clone(),
                },
            )
        })
        .transpose()?;

    Ok(AccessToken {
        access_token,
        id_token,
        expires_in: settings.access_token_ttl.num_seconds(),
    })
}

/// Mint the self-issued token a service account presents: `iss` and
/// `sub` are both `serviceaccount:<id>`, signed with the account's own
/// private key.
pub fn mint_service_account_token(
    key: &SigningKey,
    account_id: &str,
    ttl: Duration,
) -> Result<String, AuthError> {
    let issued_at = Utc::now();
    let subject = Subject::service_account(account_id).to_string();
    let claims = AccessTokenClaims {
        iat: issued_at.timestamp(),
        exp: (issued_at + ttl).timestamp(),
        iss: subject.clone(),
        sub: subject,
        sid: None,
        aud: None,
    };
    sign(key, &claims)
}

/// Unverified `iss`/`sub`, read only to pick the verification key.
#[derive(Deserialize)]
struct RoutingClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
}

fn peek_routing_claims(token: &str) -> Result<RoutingClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<RoutingClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenInvalid(e.to_string()))
}

/// Verify a token and return the `(sub, sid)` it asserts.
pub fn verify_access_token(
    system_key: &VerifyingKey,
    service_accounts: &ServiceAccountRegistry,
    token: &str,
) -> Result<VerifiedToken, AuthError> {
    let header =
        jsonwebtoken::decode_header(token).map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
    if header.alg != Algorithm::ES256 {
        return Err(AuthError::UnsupportedAlgorithm);
    }

    let routing = peek_routing_claims(token)?;
    let key = match routing.iss.as_deref() {
        Some(iss) if iss.starts_with(SERVICE_ACCOUNT_PREFIX) => {
            let sub = routing
                .sub
                .as_deref()
                .ok_or_else(|| AuthError::MalformedClaims("missing sub".into()))?;
            if sub != iss {
                return Err(AuthError::UnexpectedSubject);
            }
            let id = &iss[SERVICE_ACCOUNT_PREFIX.len()..];
            service_accounts
                .get(id)
                .map(|account| account.key())
                .ok_or_else(|| AuthError::UnknownServiceAccount(id.to_string()))?
        }
        _ => {
            if header.kid.as_deref() != Some(system_key.kid()) {
                return Err(AuthError::UnknownKeyId);
            }
            system_key
        }
    };

    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = jsonwebtoken::decode::<AccessTokenClaims>(token, key.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
            JwtErrorKind::MissingRequiredClaim(claim) => {
                AuthError::MalformedClaims(format!("missing {claim}"))
            }
            JwtErrorKind::Json(err) => AuthError::MalformedClaims(err.to_string()),
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    if claims.sub.is_empty() {
        return Err(AuthError::MalformedClaims("empty sub".into()));
    }

    Ok(VerifiedToken {
        sub: claims.sub,
        sid: claims.sid.unwrap_or_default(),
    })
}

/// Generate a cryptographically random opaque refresh token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_refresh_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw refresh token, base64url-encoded.
///
/// This is the value stored in the database as
/// `session.refresh_token_hash`.
pub fn hash_refresh_token(raw: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(raw.as_bytes()))
}
