// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication filter for Axum.
//!
//! Every request passes through [`authentication_filter`]:
//!
//! 1. Public routes (see [`RouteSource`]) are dispatched untouched.
//! 2. Otherwise a token is resolved from the transport, in order:
//!    the `access_token` cookie, `Authorization`, `X-Gateway-Authorization`.
//!    The first non-blank value wins and a leading `Bearer ` is stripped.
//! 3. The token is validated by the configured [`TokenValidator`].
//! 4. On success the [`AuthenticationContext`] is placed in the request
//!    extensions and installed for the rest of the request; the handler runs
//!    inside that scope.
//! 5. On failure the handler is never called. `BadRequest` and
//!    `Authentication` failures are answered with the structured error body;
//!    anything else is logged and answered with a generic 500.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{HeaderName, AUTHORIZATION},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::context::AuthenticationContext;
use super::error::AuthError;
use super::patterns::RouteSource;
use super::token::TokenValidator;
use crate::error::ExceptionTranslator;

/// Name of the HTTP-only cookie carrying the token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Header set by the API gateway when it forwards a caller's token.
pub const GATEWAY_AUTHORIZATION: HeaderName = HeaderName::from_static("x-gateway-authorization");

/// Scheme prefix stripped from resolved tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of a successful pass through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Route is public; dispatch without a context.
    Public,
    /// Caller identified; dispatch with this context.
    Authenticated(AuthenticationContext),
}

/// Decides, per request, whether and as whom a caller is authenticated.
#[derive(Clone)]
pub struct AuthenticationFilter {
    validator: Arc<dyn TokenValidator>,
    routes: Arc<dyn RouteSource>,
    translator: ExceptionTranslator,
}

impl AuthenticationFilter {
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        routes: Arc<dyn RouteSource>,
        translator: ExceptionTranslator,
    ) -> Self {
        Self {
            validator,
            routes,
            translator,
        }
    }

    pub fn translator(&self) -> &ExceptionTranslator {
        &self.translator
    }

    /// Classify a request without running it.
    pub fn authenticate(&self, headers: &HeaderMap, path: &str) -> Result<FilterDecision, AuthError> {
        if self.routes.is_public(path) {
            return Ok(FilterDecision::Public);
        }

        let token = resolve_token(headers).unwrap_or_default();
        let principal = self.validator.validate(&token)?;

        Ok(FilterDecision::Authenticated(AuthenticationContext::from_principal(
            principal, token,
        )))
    }
}

impl std::fmt::Debug for AuthenticationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationFilter").finish_non_exhaustive()
    }
}

/// Find the caller's token in the request transport.
///
/// Returns `None` when no carrier holds a non-blank value, or when the first
/// non-blank one is a bare `Bearer ` prefix. A value without the prefix is
/// returned as-is.
pub fn resolve_token(headers: &HeaderMap) -> Option<String> {
    let cookie = CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string());

    let header = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let raw = [cookie, header(&AUTHORIZATION), header(&GATEWAY_AUTHORIZATION)]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())?;

    // Strip the prefix before trimming so "Bearer " alone resolves to blank
    let raw = raw.trim_start();
    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Authentication middleware.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/users/me", get(me))
///     .layer(axum::middleware::from_fn_with_state(filter, authentication_filter));
/// ```
pub async fn authentication_filter(
    State(filter): State<AuthenticationFilter>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    tracing::debug!(method = %request.method(), path = %path, "authentication filter");

    match filter.authenticate(request.headers(), &path) {
        Ok(FilterDecision::Public) => next.run(request).await,
        Ok(FilterDecision::Authenticated(context)) => {
            tracing::debug!(principal = %context.principal, path = %path, "request authenticated");
            request.extensions_mut().insert(context.clone());
            context.scope(next.run(request)).await
        }
        Err(error) => {
            if error.is_locally_handled() {
                tracing::info!(path = %path, error = %error, "request rejected");
            }
            filter.translator.translate(&error).into_response()
        }
    }
}
