// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated requests.
//!
//! The authentication filter has already validated the token and placed the
//! [`AuthenticationContext`] in the request extensions. These extractors hand
//! it to handlers:
//!
//! ```rust,ignore
//! async fn me(Auth(ctx): Auth) -> impl IntoResponse {
//!     // ctx.principal, ctx.authorities
//! }
//! ```
//!
//! Rejections go through the [`ExceptionTranslator`](crate::error::ExceptionTranslator)
//! so they share the structured error body with the filter.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::context::AuthenticationContext;
use super::roles::Role;
use super::AuthError;
use crate::error::ApiError;
use crate::i18n::keys;
use crate::state::AppState;

/// Extractor for authenticated callers.
///
/// Rejects with 401 when the request reached the handler without a context,
/// which happens for handlers mounted on public routes.
pub struct Auth(pub AuthenticationContext);

impl FromRequestParts<AppState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticationContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                tracing::debug!(path = %parts.uri.path(), "no authentication context for protected handler");
                state
                    .translator
                    .translate(&AuthError::authentication(keys::UNAUTHORIZED))
            })
    }
}

/// Fails with `AccessDenied` unless `context` is granted `role`.
pub fn require_role(context: &AuthenticationContext, role: Role) -> Result<(), AuthError> {
    if role.granted_by(&context.authorities) {
        Ok(())
    } else {
        tracing::info!(principal = %context.principal, required = %role, "access denied");
        Err(AuthError::access_denied(keys::FORBIDDEN))
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticationContext);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(context) = Auth::from_request_parts(parts, state).await?;

        require_role(&context, Role::Admin).map_err(|e| state.translator.translate(&e))?;

        Ok(AdminOnly(context))
    }
}
