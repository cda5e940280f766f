// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup; any error here is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_BASE64_SECRET` | Base64 HMAC signing secret (≥ 32 bytes decoded) | Required |
//! | `AUTH_TOKEN_VALIDITY_SECONDS` | Normal token lifetime | `86400` |
//! | `AUTH_TOKEN_VALIDITY_REMEMBER_ME_SECONDS` | "Remember me" token lifetime | `2592000` |
//! | `AUTH_PUBLIC_PATTERNS` | Comma-separated public route globs | `/api/p/**,/docs/**,/api-doc/**` |
//! | `AUTH_COOKIE_SECURE` | Emit `Secure` on the token cookie | `true` |
//! | `OAUTH2_ENABLED` | Enable Google sign-in | `false` |
//! | `OAUTH2_GOOGLE_CLIENT_ID` | OAuth2 client id | Required when enabled |
//! | `OAUTH2_GOOGLE_CLIENT_SECRET` | OAuth2 client secret | Required when enabled |
//! | `OAUTH2_GOOGLE_REDIRECT_URI` | Registered callback URL | Required when enabled |
//! | `OAUTH2_GOOGLE_SCOPES` | Comma-separated scopes | `openid,email,profile` |
//! | `OAUTH2_GOOGLE_AUTHORIZATION_URI` | Consent page | Google |
//! | `OAUTH2_GOOGLE_TOKEN_URI` | Code exchange endpoint | Google |
//! | `OAUTH2_GOOGLE_USER_INFO_URI` | Profile endpoint | Google |
//! | `OAUTH2_HTTP_TIMEOUT_SECONDS` | Timeout for provider calls | `10` |
//! | `SEED_ADMIN_USERNAME` | Admin account created at startup | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password for the seeded admin | Required with username |
//! | `SEED_ADMIN_EMAIL` | E-mail for the seeded admin | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or text) | text |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use crate::auth::cookie::CookieSettings;
use crate::auth::patterns::{PatternError, RoutePatterns};
use crate::auth::token::{SigningKey, SigningKeyError, TokenValidity};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

pub const AUTH_BASE64_SECRET_ENV: &str = "AUTH_BASE64_SECRET";
pub const AUTH_TOKEN_VALIDITY_ENV: &str = "AUTH_TOKEN_VALIDITY_SECONDS";
pub const AUTH_TOKEN_VALIDITY_REMEMBER_ME_ENV: &str = "AUTH_TOKEN_VALIDITY_REMEMBER_ME_SECONDS";
pub const AUTH_PUBLIC_PATTERNS_ENV: &str = "AUTH_PUBLIC_PATTERNS";
pub const AUTH_COOKIE_SECURE_ENV: &str = "AUTH_COOKIE_SECURE";

pub const OAUTH2_ENABLED_ENV: &str = "OAUTH2_ENABLED";
pub const OAUTH2_GOOGLE_CLIENT_ID_ENV: &str = "OAUTH2_GOOGLE_CLIENT_ID";
pub const OAUTH2_GOOGLE_CLIENT_SECRET_ENV: &str = "OAUTH2_GOOGLE_CLIENT_SECRET";
pub const OAUTH2_GOOGLE_REDIRECT_URI_ENV: &str = "OAUTH2_GOOGLE_REDIRECT_URI";
pub const OAUTH2_GOOGLE_SCOPES_ENV: &str = "OAUTH2_GOOGLE_SCOPES";
pub const OAUTH2_GOOGLE_AUTHORIZATION_URI_ENV: &str = "OAUTH2_GOOGLE_AUTHORIZATION_URI";
pub const OAUTH2_GOOGLE_TOKEN_URI_ENV: &str = "OAUTH2_GOOGLE_TOKEN_URI";
pub const OAUTH2_GOOGLE_USER_INFO_URI_ENV: &str = "OAUTH2_GOOGLE_USER_INFO_URI";
pub const OAUTH2_HTTP_TIMEOUT_ENV: &str = "OAUTH2_HTTP_TIMEOUT_SECONDS";

pub const SEED_ADMIN_USERNAME_ENV: &str = "SEED_ADMIN_USERNAME";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_VALIDITY_SECONDS: u64 = 86_400;
pub const DEFAULT_TOKEN_VALIDITY_REMEMBER_ME_SECONDS: u64 = 2_592_000;
pub const DEFAULT_PUBLIC_PATTERNS: &str = "/api/p/**,/docs/**,/api-doc/**";
pub const DEFAULT_GOOGLE_SCOPES: &str = "openid,email,profile";
pub const DEFAULT_GOOGLE_AUTHORIZATION_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GOOGLE_USER_INFO_URI: &str = "https://openidconnect.googleapis.com/v1/userinfo";
pub const DEFAULT_OAUTH2_HTTP_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error(transparent)]
    SigningKey(#[from] SigningKeyError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Bind address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: optional(&lookup, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token, route and cookie settings for the authentication filter.
#[derive(Clone)]
pub struct SecurityConfig {
    signing_secret: String,
    pub validity: TokenValidity,
    pub public_patterns: Vec<String>,
    pub cookie: CookieSettings,
}

impl SecurityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_secret =
            optional(&lookup, AUTH_BASE64_SECRET_ENV).ok_or(ConfigError::Missing(AUTH_BASE64_SECRET_ENV))?;

        let validity = TokenValidity {
            normal: validity_seconds(&lookup, AUTH_TOKEN_VALIDITY_ENV, DEFAULT_TOKEN_VALIDITY_SECONDS)?,
            remember_me: validity_seconds(
                &lookup,
                AUTH_TOKEN_VALIDITY_REMEMBER_ME_ENV,
                DEFAULT_TOKEN_VALIDITY_REMEMBER_ME_SECONDS,
            )?,
        };

        let public_patterns = split_list(
            &optional(&lookup, AUTH_PUBLIC_PATTERNS_ENV).unwrap_or_else(|| DEFAULT_PUBLIC_PATTERNS.to_string()),
        );

        Ok(Self {
            signing_secret,
            validity,
            public_patterns,
            cookie: CookieSettings {
                secure: parse_or(&lookup, AUTH_COOKIE_SECURE_ENV, true)?,
            },
        })
    }

    /// Configuration with defaults for everything but the secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            signing_secret: secret.into(),
            validity: TokenValidity {
                normal: Duration::from_secs(DEFAULT_TOKEN_VALIDITY_SECONDS),
                remember_me: Duration::from_secs(DEFAULT_TOKEN_VALIDITY_REMEMBER_ME_SECONDS),
            },
            public_patterns: split_list(DEFAULT_PUBLIC_PATTERNS),
            cookie: CookieSettings::default(),
        }
    }

    pub fn with_public_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Decode the signing key. Called once at startup.
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        Ok(SigningKey::from_base64(&self.signing_secret)?)
    }

    /// Compile the public route patterns. Called once at startup.
    pub fn route_patterns(&self) -> Result<RoutePatterns, ConfigError> {
        Ok(RoutePatterns::compile(&self.public_patterns)?)
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the signing secret
        f.debug_struct("SecurityConfig")
            .field("validity", &self.validity)
            .field("public_patterns", &self.public_patterns)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

/// Google OAuth2 client settings.
#[derive(Clone)]
pub struct OAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_uri: String,
    pub token_uri: String,
    pub user_info_uri: String,
    pub timeout: Duration,
}

impl OAuth2Config {
    /// `None` when federated sign-in is disabled.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        if !parse_or(&lookup, OAUTH2_ENABLED_ENV, false)? {
            return Ok(None);
        }

        let required = |name: &'static str| optional(&lookup, name).ok_or(ConfigError::Missing(name));
        let or_default =
            |name: &'static str, default: &str| optional(&lookup, name).unwrap_or_else(|| default.to_string());

        let timeout = parse_or(&lookup, OAUTH2_HTTP_TIMEOUT_ENV, DEFAULT_OAUTH2_HTTP_TIMEOUT_SECONDS)?;
        if timeout == 0 {
            return Err(ConfigError::Invalid {
                name: OAUTH2_HTTP_TIMEOUT_ENV,
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Some(Self {
            client_id: required(OAUTH2_GOOGLE_CLIENT_ID_ENV)?,
            client_secret: required(OAUTH2_GOOGLE_CLIENT_SECRET_ENV)?,
            redirect_uri: required(OAUTH2_GOOGLE_REDIRECT_URI_ENV)?,
            scopes: split_list(&or_default(OAUTH2_GOOGLE_SCOPES_ENV, DEFAULT_GOOGLE_SCOPES)),
            authorization_uri: or_default(OAUTH2_GOOGLE_AUTHORIZATION_URI_ENV, DEFAULT_GOOGLE_AUTHORIZATION_URI),
            token_uri: or_default(OAUTH2_GOOGLE_TOKEN_URI_ENV, DEFAULT_GOOGLE_TOKEN_URI),
            user_info_uri: or_default(OAUTH2_GOOGLE_USER_INFO_URI_ENV, DEFAULT_GOOGLE_USER_INFO_URI),
            timeout: Duration::from_secs(timeout),
        }))
    }
}

impl std::fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the client secret
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("token_uri", &self.token_uri)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Administrator account created at startup.
#[derive(Clone)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

impl SeedAdmin {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(username) = optional(&lookup, SEED_ADMIN_USERNAME_ENV) else {
            return Ok(None);
        };
        let password =
            optional(&lookup, SEED_ADMIN_PASSWORD_ENV).ok_or(ConfigError::Missing(SEED_ADMIN_PASSWORD_ENV))?;

        Ok(Some(Self {
            username,
            password,
            email: optional(&lookup, SEED_ADMIN_EMAIL_ENV),
        }))
    }
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

fn validity_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let seconds: u64 = parse_or(lookup, name, default)?;
    if seconds == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "token validity must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
