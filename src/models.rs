// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Accounts as stored by the account repository, plus the request and
//! response bodies of the REST API. API types derive `ToSchema` for the
//! OpenAPI document.
//!
//! ## Response Envelope
//!
//! Successful responses use the same envelope as errors, with
//! `success: true`: `{code, success, message}` ([`StatusResponse`]) or
//! `{code, success, message, result}` ([`BaseResponse`]).

use std::collections::BTreeSet;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Accounts
// =============================================================================

/// Actor recorded in audit columns when the system itself makes a change.
pub const SYSTEM_ACTOR: &str = "system";

/// A local user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// PHC-formatted password hash
    pub password_hash: String,
    /// Role names, unique and unordered
    pub authorities: BTreeSet<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_by: String,
    pub last_modified_at: DateTime<Utc>,
}

/// An account that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub authorities: BTreeSet<String>,
    pub created_by: String,
}

// =============================================================================
// Response Envelope
// =============================================================================

/// Success body without payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// HTTP status code
    pub code: u16,
    /// Always `true` for this type
    pub success: bool,
    /// Localized message
    pub message: String,
}

impl StatusResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            success: true,
            message: message.into(),
        }
    }
}

/// Success body with payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BaseResponse<T> {
    pub code: u16,
    pub success: bool,
    pub message: String,
    pub result: T,
}

impl<T> BaseResponse<T> {
    pub fn ok(message: impl Into<String>, result: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            success: true,
            message: message.into(),
            result,
        }
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Username/password login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Issue a token with the extended validity window.
    #[serde(default)]
    pub remember_me: bool,
    /// Device the token is issued to.
    #[serde(default)]
    pub device_id: Option<String>,
}

/// OAuth2 callback query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuth2CallbackQuery {
    /// Opaque state echoed by the provider
    #[serde(default)]
    pub state: Option<String>,
    /// Authorization code
    #[serde(default)]
    pub code: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// Public view of an account (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub authorities: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_by: String,
    pub last_modified_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            authorities: account.authorities.into_iter().collect(),
            created_by: account.created_by,
            created_at: account.created_at,
            last_modified_by: account.last_modified_by,
            last_modified_at: account.last_modified_at,
        }
    }
}
