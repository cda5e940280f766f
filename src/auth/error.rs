// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Failures are classified into four kinds. Only `BadRequest` and
//! `Authentication` are handled locally by the filter; `AccessDenied` is
//! raised by authority guards downstream; `Internal` is logged and rendered
//! as a generic 500 by the outer layer.

use axum::http::StatusCode;

use crate::i18n::keys;

/// Classified authentication failure.
///
/// Each client-facing variant carries a message key and positional arguments
/// for the translator, never a preformatted message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Credential input is missing or malformed.
    #[error("bad request: {key}")]
    BadRequest { key: &'static str, args: Vec<String> },

    /// Credential present but invalid (signature, expiry, structure, authorities).
    #[error("authentication failed: {key}")]
    Authentication { key: &'static str, args: Vec<String> },

    /// Identity is valid but lacks the required authority.
    #[error("access denied: {key}")]
    AccessDenied { key: &'static str, args: Vec<String> },

    /// Anything unclassified. The detail is for logs only.
    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn bad_request(key: &'static str) -> Self {
        Self::BadRequest {
            key,
            args: Vec::new(),
        }
    }

    pub fn authentication(key: &'static str) -> Self {
        Self::Authentication {
            key,
            args: Vec::new(),
        }
    }

    pub fn access_denied(key: &'static str) -> Self {
        Self::AccessDenied {
            key,
            args: Vec::new(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Attach positional arguments to a client-facing variant.
    pub fn with_args(self, args: impl IntoIterator<Item = String>) -> Self {
        match self {
            Self::BadRequest { key, .. } => Self::BadRequest {
                key,
                args: args.into_iter().collect(),
            },
            Self::Authentication { key, .. } => Self::Authentication {
                key,
                args: args.into_iter().collect(),
            },
            Self::AccessDenied { key, .. } => Self::AccessDenied {
                key,
                args: args.into_iter().collect(),
            },
            internal @ Self::Internal(_) => internal,
        }
    }

    /// The message key and arguments used to build the response message.
    pub fn message_key(&self) -> (&'static str, &[String]) {
        match self {
            Self::BadRequest { key, args }
            | Self::Authentication { key, args }
            | Self::AccessDenied { key, args } => (*key, args.as_slice()),
            Self::Internal(_) => (keys::INTERNAL, &[]),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the filter answers this error itself instead of re-raising it.
    pub fn is_locally_handled(&self) -> bool {
        matches!(self, Self::BadRequest { .. } | Self::Authentication { .. })
    }
}
