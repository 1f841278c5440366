//! P-256 key material for ES256 tokens.
//!
//! Keys are parsed once at startup. Every key carries its `kid`: the
//! base64url-encoded SHA-256 JWK thumbprint (RFC 7638) of the public
//! key, so a verifier never has to trust a key reference supplied by
//! the token itself.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{DecodingKey, EncodingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, LineEnding};
use p256::{PublicKey, SecretKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Public half of a P-256 key as a JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicJwk {
    pub kty: &'static str,
    pub crv: &'static str,
    pub x: String,
    pub y: String,
    pub alg: &'static str,
    #[serde(rename = "use")]
    pub key_use: &'static str,
    pub kid: String,
}

/// A public key able to verify ES256 signatures.
#[derive(Clone)]
pub struct VerifyingKey {
    decoding: DecodingKey,
    jwk: PublicJwk,
}

impl VerifyingKey {
    /// Parse an SPKI (`BEGIN PUBLIC KEY`) PEM.
    pub fn from_pem(pem: &str) -> Result<Self, AuthError> {
        let public = PublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| AuthError::InvalidKey(format!("bad public key: {e}")))?;
        Self::from_public_key(&public)
    }

    fn from_public_key(public: &PublicKey) -> Result<Self, AuthError> {
        let point = public.to_encoded_point(false);
        let (x, y) = match (point.x(), point.y()) {
            (Some(x), Some(y)) => (URL_SAFE_NO_PAD.encode(x), URL_SAFE_NO_PAD.encode(y)),
            _ => return Err(AuthError::InvalidKey("public key is the identity".into())),
        };

        // RFC 7638: required members only, lexicographic order, no whitespace.
        let canonical = format!(r#"{{"crv":"P-256","kty":"EC","x":"{x}","y":"{y}"}}"#);
        let kid = URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()));

        let decoding = DecodingKey::from_ec_components(&x, &y)
            .map_err(|e| AuthError::InvalidKey(format!("bad public key: {e}")))?;

        Ok(Self {
            decoding,
            jwk: PublicJwk {
                kty: "EC",
                crv: "P-256",
                x,
                y,
                alg: "ES256",
                key_use: "sig",
                kid,
            },
        })
    }

    pub fn kid(&self) -> &str {
        &self.jwk.kid
    }

    pub fn jwk(&self) -> &PublicJwk {
        &self.jwk
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("kid", &self.jwk.kid)
            .finish()
    }
}

/// A private key able to sign ES256 tokens, with its public half.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    verifying: VerifyingKey,
}

impl SigningKey {
    /// Parse a PKCS#8 (`BEGIN PRIVATE KEY`) or SEC1
    /// (`BEGIN EC PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str) -> Result<Self, AuthError> {
        let pem = pem.trim();
        let secret = SecretKey::from_pkcs8_pem(pem)
            .or_else(|_| SecretKey::from_sec1_pem(pem))
            .map_err(|e| AuthError::InvalidKey(format!("bad private key: {e}")))?;

        // The signer only accepts PKCS#8, so normalise SEC1 input.
        let pkcs8 = secret
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AuthError::InvalidKey(format!("bad private key: {e}")))?;
        let encoding = EncodingKey::from_ec_pem(pkcs8.as_bytes())
            .map_err(|e| AuthError::InvalidKey(format!("bad private key: {e}")))?;

        Ok(Self {
            encoding,
            verifying: VerifyingKey::from_public_key(&secret.public_key())?,
        })
    }

    pub fn kid(&self) -> &str {
        self.verifying.kid()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKCS8: &str = include_str!("../tests/fixtures/system_private.pem");
    const SEC1: &str = include_str!("../tests/fixtures/system_private_sec1.pem");
    const PUBLIC: &str = include_str!("../tests/fixtures/system_public.pem");

    #[test]
    fn kid_is_the_jwk_thumbprint() {
        let key = VerifyingKey::from_pem(PUBLIC).unwrap();
        assert_eq!(key.kid(), "kKCFQK0iB9-Lb67ilUz4U4KeD5-aL8KiZeJJ9K6blIc");
        assert_eq!(key.jwk().x, "6f_KYZCbdRphivrdcinDic2WYS1ZFjrMGHFDhGpq-_I");
        assert_eq!(key.jwk().y, "T4hz7K8D98zaYHoJLMx8QVVi7-RjZplnHPe04FL6EUo");
    }

    #[test]
    fn private_key_formats_agree() {
        let pkcs8 = SigningKey::from_pem(PKCS8).unwrap();
        let sec1 = SigningKey::from_pem(SEC1).unwrap();
        let public = VerifyingKey::from_pem(PUBLIC).unwrap();
        assert_eq!(pkcs8.kid(), public.kid());
        assert_eq!(sec1.kid(), public.kid());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            SigningKey::from_pem("not a key"),
            Err(AuthError::InvalidKey(_))
        ));
        assert!(matches!(
            VerifyingKey::from_pem(PKCS8),
            Err(AuthError::InvalidKey(_))
        ));
    }

    #[test]
    fn jwk_serializes_use_member() {
        let key = VerifyingKey::from_pem(PUBLIC).unwrap();
        let json = serde_json::to_value(key.jwk()).unwrap();
        assert_eq!(json["use"], "sig");
        assert_eq!(json["alg"], "ES256");
        assert_eq!(json["kty"], "EC");
    }

    #[test]
    fn debug_does_not_print_key_material() {
        let key = SigningKey::from_pem(PKCS8).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("kid"));
        assert!(!debug.contains("PRIVATE"));
    }
}
