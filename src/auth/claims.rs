// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the validated principal they resolve to.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenError;

/// Delimiter between authorities inside the `authorities` claim.
pub const AUTHORITY_DELIMITER: char = ',';

/// Claims carried by a signed identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username of the principal)
    pub sub: String,

    /// Local account identifier
    #[serde(rename = "userId")]
    pub user_id: i64,

    /// Device the token was issued to (password login only)
    #[serde(rename = "deviceId", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Comma-joined authority names
    #[serde(default)]
    pub authorities: Option<String>,

    /// Issued at (seconds since epoch)
    pub iat: i64,

    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Identity extracted from a token that passed every validation step.
///
/// This is the only value the codec hands out on success; a failed
/// validation never yields partially-populated claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub username: String,
    pub user_id: i64,
    pub device_id: Option<String>,
    pub authorities: BTreeSet<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedPrincipal {
    /// Build the principal from decoded claims.
    ///
    /// A token that asserts no authority is rejected: every principal must
    /// carry at least one.
    pub fn from_claims(claims: TokenClaims) -> Result<Self, TokenError> {
        let authorities = claims
            .authorities
            .as_deref()
            .map(split_authorities)
            .unwrap_or_default();

        if authorities.is_empty() {
            return Err(TokenError::MissingAuthorities);
        }

        Ok(Self {
            username: claims.sub,
            user_id: claims.user_id,
            device_id: claims.device_id,
            authorities,
            issued_at: timestamp(claims.iat)?,
            expires_at: timestamp(claims.exp)?,
        })
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// Split, trim and deduplicate a delimited authorities string.
pub fn split_authorities(raw: &str) -> BTreeSet<String> {
    raw.split(AUTHORITY_DELIMITER)
        .map(str::trim)
        .filter(|authority| !authority.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join authorities into the claim representation.
pub fn join_authorities<'a>(authorities: impl IntoIterator<Item = &'a String>) -> String {
    authorities
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| TokenError::Malformed(format!("timestamp out of range: {seconds}")))
}
