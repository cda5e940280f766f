// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The HTTP-only cookie that carries the token between requests.

use std::time::Duration;

use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::response::Response;

use super::error::AuthError;
use super::middleware::ACCESS_TOKEN_COOKIE;

/// Cookie attributes shared by every issued token cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    /// Emit the `Secure` attribute (HTTPS only).
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self { secure: true }
    }
}

/// Token wrapped for the `Set-Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenCookie {
    value: String,
    max_age: Duration,
    settings: CookieSettings,
}

impl TokenCookie {
    pub fn new(token: impl Into<String>, max_age: Duration, settings: CookieSettings) -> Self {
        Self {
            value: token.into(),
            max_age,
            settings,
        }
    }

    /// Cookie that tells the browser to drop the token.
    pub fn cleared(settings: CookieSettings) -> Self {
        Self::new(String::new(), Duration::ZERO, settings)
    }

    pub fn name(&self) -> &'static str {
        ACCESS_TOKEN_COOKIE
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Render the `Set-Cookie` header value.
    pub fn header_string(&self) -> String {
        let secure = if self.settings.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            ACCESS_TOKEN_COOKIE,
            self.value,
            self.max_age.as_secs(),
            secure
        )
    }

    /// `Set-Cookie` header value.
    pub fn header_value(&self) -> Result<HeaderValue, AuthError> {
        HeaderValue::from_str(&self.header_string())
            .map_err(|e| AuthError::internal(format!("token cookie is not a valid header: {e}")))
    }

    /// Add the `Set-Cookie` header to `response`.
    pub fn apply(&self, response: &mut Response) -> Result<(), AuthError> {
        response.headers_mut().append(SET_COOKIE, self.header_value()?);
        Ok(())
    }
}

impl std::fmt::Debug for TokenCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the token
        f.debug_struct("TokenCookie")
            .field("max_age", &self.max_age)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
