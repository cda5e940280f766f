// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed identity tokens.
//!
//! Tokens are compact JWS values (`header.claims.signature`, base64url)
//! signed with an HMAC key shared by issuer and validator. The key is decoded
//! once from a base64 secret at startup and never changes afterwards.
//!
//! ## Validation
//!
//! - blank input → [`TokenError::Empty`]
//! - unparseable structure / claims → [`TokenError::Malformed`]
//! - signature or algorithm mismatch → [`TokenError::SignatureInvalid`]
//! - `now > exp` → [`TokenError::Expired`] (millisecond comparison, no leeway)
//! - no authorities → [`TokenError::MissingAuthorities`]
//!
//! Callers only ever see the generic classification from
//! [`TokenError::classify`]; the precise reason is logged.

use std::collections::BTreeSet;
use std::time::Duration;

use base64ct::{Base64, Base64Unpadded, Base64Url, Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{join_authorities, AuthenticatedPrincipal, TokenClaims};
use super::error::AuthError;
use crate::i18n::keys;

/// Minimum HMAC key length in bytes (256 bits).
pub const MIN_KEY_LENGTH: usize = 32;

/// Errors raised while loading the signing key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningKeyError {
    #[error("signing secret is missing or blank")]
    Missing,

    #[error("signing secret is not valid base64")]
    InvalidBase64,

    #[error("signing key is {0} bytes, at least {MIN_KEY_LENGTH} are required")]
    TooShort(usize),
}

/// Token creation and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token carries no authorities")]
    MissingAuthorities,

    #[error("token validity must be at least one second")]
    InvalidValidity,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Map a codec failure to the client-facing classification.
    ///
    /// Every codec-level failure collapses into the same generic
    /// "invalid or expired" message.
    pub fn classify(&self) -> AuthError {
        match self {
            Self::Empty => AuthError::bad_request(keys::BAD_CREDENTIALS),
            Self::Malformed(_) | Self::SignatureInvalid | Self::Expired | Self::MissingAuthorities => {
                AuthError::authentication(keys::TOKEN_INVALID_OR_EXPIRED)
            }
            Self::InvalidValidity | Self::Signing(_) => AuthError::internal(self.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::SignatureInvalid,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// HMAC key material shared by token creation and validation.
///
/// Key bytes are never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Decode the key from a base64 secret (standard or URL-safe alphabet,
    /// padded or not).
    pub fn from_base64(secret: &str) -> Result<Self, SigningKeyError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(SigningKeyError::Missing);
        }

        let bytes = Base64::decode_vec(secret)
            .or_else(|_| Base64Unpadded::decode_vec(secret))
            .or_else(|_| Base64Url::decode_vec(secret))
            .or_else(|_| Base64UrlUnpadded::decode_vec(secret))
            .map_err(|_| SigningKeyError::InvalidBase64)?;

        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SigningKeyError> {
        if bytes.is_empty() {
            return Err(SigningKeyError::Missing);
        }
        if bytes.len() < MIN_KEY_LENGTH {
            return Err(SigningKeyError::TooShort(bytes.len()));
        }
        Ok(Self { bytes })
    }

    /// HMAC variant chosen by key length.
    pub fn algorithm(&self) -> Algorithm {
        match self.bytes.len() {
            n if n >= 64 => Algorithm::HS512,
            n if n >= 48 => Algorithm::HS384,
            _ => Algorithm::HS256,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

/// Which configured validity window a new token gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLifetime {
    #[default]
    Normal,
    RememberMe,
}

/// Configured validity windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenValidity {
    pub normal: Duration,
    pub remember_me: Duration,
}

impl TokenValidity {
    pub fn duration(&self, lifetime: TokenLifetime) -> Duration {
        match lifetime {
            TokenLifetime::Normal => self.normal,
            TokenLifetime::RememberMe => self.remember_me,
        }
    }
}

/// Validates a raw token string into an authenticated principal.
///
/// The filter depends on this capability rather than on the codec itself.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError>;
}

/// Encodes, decodes and validates signed identity tokens.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: TokenValidity,
}

impl TokenCodec {
    pub fn new(key: &SigningKey, validity: TokenValidity) -> Self {
        tracing::debug!(algorithm = ?key.algorithm(), "token codec initialised");
        Self {
            algorithm: key.algorithm(),
            encoding_key: EncodingKey::from_secret(&key.bytes),
            decoding_key: DecodingKey::from_secret(&key.bytes),
            validity,
        }
    }

    pub fn validity(&self) -> TokenValidity {
        self.validity
    }

    /// Create a token for one of the configured lifetimes.
    pub fn create_token_for(
        &self,
        principal: &str,
        user_id: i64,
        authorities: &BTreeSet<String>,
        device_id: Option<&str>,
        lifetime: TokenLifetime,
    ) -> Result<String, TokenError> {
        self.create_token(
            principal,
            user_id,
            authorities,
            device_id,
            self.validity.duration(lifetime),
        )
    }

    /// Create a token valid from now for `validity`.
    pub fn create_token(
        &self,
        principal: &str,
        user_id: i64,
        authorities: &BTreeSet<String>,
        device_id: Option<&str>,
        validity: Duration,
    ) -> Result<String, TokenError> {
        self.create_token_at(principal, user_id, authorities, device_id, validity, Utc::now())
    }

    pub(crate) fn create_token_at(
        &self,
        principal: &str,
        user_id: i64,
        authorities: &BTreeSet<String>,
        device_id: Option<&str>,
        validity: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if validity < Duration::from_secs(1) {
            return Err(TokenError::InvalidValidity);
        }
        if authorities.iter().all(|a| a.trim().is_empty()) {
            return Err(TokenError::MissingAuthorities);
        }

        let validity = TimeDelta::from_std(validity).map_err(|_| TokenError::InvalidValidity)?;
        let expires_at = now
            .checked_add_signed(validity)
            .ok_or(TokenError::InvalidValidity)?;

        let claims = TokenClaims {
            sub: principal.to_string(),
            user_id,
            device_id: device_id.map(str::to_string),
            authorities: Some(join_authorities(authorities)),
            iat: now.timestamp(),
            exp: ceil_seconds(expires_at),
        };

        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            TokenError::Signing(e.to_string())
        })
    }

    /// Validate a token against the current time.
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedPrincipal, TokenError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token as of `now`.
    pub fn validate_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedPrincipal, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation())?;
        let claims = data.claims;

        if now.timestamp_millis() > claims.exp.saturating_mul(1000) {
            return Err(TokenError::Expired);
        }

        AuthenticatedPrincipal::from_claims(claims)
    }

    fn validation(&self) -> Validation {
        // Expiry is checked by the codec with millisecond precision.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation
    }
}

/// Round up to whole seconds so the encoded window is never shorter than requested.
fn ceil_seconds(instant: DateTime<Utc>) -> i64 {
    if instant.timestamp_subsec_nanos() > 0 {
        instant.timestamp() + 1
    } else {
        instant.timestamp()
    }
}

impl TokenValidator for TokenCodec {
    fn validate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        self.validate_token(token).map_err(|e| {
            tracing::warn!(reason = %e, "token validation failed");
            e.classify()
        })
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("validity", &self.validity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::TimeZone;

    const SECRET: &str = "c2lnbmluZy1rZXktZm9yLXVuaXQtdGVzdHMtb25seS0wMTIzNDU2Nzg5YWJjZGVm";

    fn codec() -> TokenCodec {
        let key = SigningKey::from_base64(SECRET).unwrap();
        TokenCodec::new(
            &key,
            TokenValidity {
                normal: Duration::from_secs(3600),
                remember_me: Duration::from_secs(30 * 86400),
            },
        )
    }

    fn authorities(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn round_trip_preserves_principal_and_authorities() {
        let codec = codec();
        let roles = authorities(&["ROLE_USER", "ROLE_ADMIN"]);
        for validity in [1, 60, 86_400] {
            let token = codec
                .create_token("alice", 42, &roles, Some("laptop"), Duration::from_secs(validity))
                .unwrap();
            let principal = codec.validate_token(&token).unwrap();
            assert_eq!(principal.username, "alice");
            assert_eq!(principal.user_id, 42);
            assert_eq!(principal.device_id.as_deref(), Some("laptop"));
            assert_eq!(principal.authorities, roles);
            assert!(principal.expires_at > principal.issued_at);
        }
    }

    #[test]
    fn remember_me_uses_extended_window() {
        let codec = codec();
        let token = codec
            .create_token_for("bob", 1, &authorities(&["ROLE_USER"]), None, TokenLifetime::RememberMe)
            .unwrap();
        let principal = codec.validate_token(&token).unwrap();
        let window = (principal.expires_at - principal.issued_at).num_seconds();
        assert!((30 * 86400..=30 * 86400 + 1).contains(&window));
    }

    #[test]
    fn expiry_boundary_is_exact() {
        let codec = codec();
        let issued = Utc.timestamp_opt(1_800_000_000, 0).single().unwrap();
        let token = codec
            .create_token_at(
                "alice",
                1,
                &authorities(&["ROLE_USER"]),
                None,
                Duration::from_secs(60),
                issued,
            )
            .unwrap();
        let exp = issued + TimeDelta::seconds(60);

        let just_before = exp - TimeDelta::milliseconds(1);
        assert!(codec.validate_token_at(&token, just_before).is_ok());

        let just_after = exp + TimeDelta::milliseconds(1);
        let err = codec.validate_token_at(&token, just_after).unwrap_err();
        assert_eq!(err, TokenError::Expired);
        assert!(matches!(err.classify(), AuthError::Authentication { .. }));
    }

    #[test]
    fn tampered_signature_never_passes() {
        let codec = codec();
        let token = codec
            .create_token("alice", 1, &authorities(&["ROLE_USER"]), None, Duration::from_secs(60))
            .unwrap();
        let signature_start = token.rfind('.').unwrap() + 1;

        for index in signature_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }

            let err = codec.validate_token(&tampered).unwrap_err();
            assert!(
                matches!(err.classify(), AuthError::Authentication { .. }),
                "tampered byte {index} produced {err:?}"
            );
        }
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let other_key = SigningKey::from_bytes(vec![7u8; 64]).unwrap();
        let other = TokenCodec::new(&other_key, codec().validity());
        let token = other
            .create_token("mallory", 9, &authorities(&["ROLE_ADMIN"]), None, Duration::from_secs(60))
            .unwrap();

        let err = codec().validate_token(&token).unwrap_err();
        assert_eq!(err, TokenError::SignatureInvalid);
    }

    #[test]
    fn blank_token_is_bad_request() {
        let err = codec().validate_token("   ").unwrap_err();
        assert_eq!(err, TokenError::Empty);
        assert!(matches!(err.classify(), AuthError::BadRequest { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = codec().validate_token("not-a-token").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"eve","userId":1,"authorities":"ROLE_ADMIN","iat":1,"exp":9999999999}"#,
        );
        let token = format!("{header}.{claims}.");

        let err = codec().validate_token(&token).unwrap_err();
        assert!(matches!(err.classify(), AuthError::Authentication { .. }));
    }

    #[test]
    fn signed_token_without_authorities_is_rejected() {
        let key = SigningKey::from_base64(SECRET).unwrap();
        let claims = serde_json::json!({
            "sub": "ghost",
            "userId": 3,
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 600,
        });
        let token = jsonwebtoken::encode(
            &Header::new(key.algorithm()),
            &claims,
            &EncodingKey::from_secret(&key.bytes),
        )
        .unwrap();

        let err = codec().validate_token(&token).unwrap_err();
        assert_eq!(err, TokenError::MissingAuthorities);
        assert!(matches!(err.classify(), AuthError::Authentication { .. }));
    }

    #[test]
    fn creation_rejects_sub_second_validity() {
        let err = codec()
            .create_token("a", 1, &authorities(&["ROLE_USER"]), None, Duration::from_millis(500))
            .unwrap_err();
        assert_eq!(err, TokenError::InvalidValidity);
    }

    #[test]
    fn signing_key_rules() {
        assert_eq!(SigningKey::from_base64("  "), Err(SigningKeyError::Missing));
        assert_eq!(SigningKey::from_base64("@@@"), Err(SigningKeyError::InvalidBase64));
        assert_eq!(
            SigningKey::from_bytes(vec![1u8; 16]),
            Err(SigningKeyError::TooShort(16))
        );
        assert_eq!(SigningKey::from_bytes(vec![1u8; 32]).unwrap().algorithm(), Algorithm::HS256);
        assert_eq!(SigningKey::from_bytes(vec![1u8; 48]).unwrap().algorithm(), Algorithm::HS384);
        assert_eq!(SigningKey::from_bytes(vec![1u8; 64]).unwrap().algorithm(), Algorithm::HS512);
    }

    #[test]
    fn debug_output_hides_key_material() {
        let key = SigningKey::from_bytes(vec![0xAB; 32]).unwrap();
        let rendered = format!("{key:?} {:?}", TokenCodec::new(&key, codec().validity()));
        assert!(!rendered.contains("171"));
        assert!(rendered.contains("HS256"));
    }
}
