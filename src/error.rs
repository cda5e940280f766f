// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Structured error responses.
//!
//! Every failure a client sees has the same body:
//! `{"code": <status>, "success": false, "message": <localized>}`.
//! [`ExceptionTranslator`] is the single place that turns a classified
//! [`AuthError`] into that body, whether the failure came from the
//! authentication filter, the authentication entry point (the `Auth`
//! extractor) or an access-denied decision (`AdminOnly`).

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::i18n::{keys, MessageTranslator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Wire shape of a failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: u16,
    pub success: bool,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.status.as_u16(),
            success: false,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Maps classified failures to structured responses with localized messages.
#[derive(Clone)]
pub struct ExceptionTranslator {
    messages: Arc<dyn MessageTranslator>,
}

impl ExceptionTranslator {
    pub fn new(messages: Arc<dyn MessageTranslator>) -> Self {
        Self { messages }
    }

    /// Translate a message key with positional arguments.
    pub fn message(&self, key: &str, args: &[String]) -> String {
        self.messages.translate(key, args)
    }

    /// Build the response for a classified failure.
    ///
    /// `Internal` detail is logged here and replaced by the generic message.
    pub fn translate(&self, error: &AuthError) -> ApiError {
        if let AuthError::Internal(detail) = error {
            tracing::error!(detail = %detail, "unclassified failure in authentication pipeline");
        }

        let (key, args) = error.message_key();
        ApiError::new(error.status_code(), self.messages.translate(key, args))
    }

    /// Generic 500 used by the outer panic guard.
    pub fn internal_error(&self) -> ApiError {
        ApiError::internal(self.messages.translate(keys::INTERNAL, &[]))
    }
}

impl std::fmt::Debug for ExceptionTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionTranslator").finish_non_exhaustive()
    }
}
