// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped authentication context.
//!
//! The context is bound to the task processing one request through a
//! task-local scope. It is visible only inside [`AuthenticationContext::scope`]
//! and is gone as soon as the scoped future completes, panics or is dropped.
//! Handlers normally receive it explicitly through the `Auth` extractor; the
//! task-local lookup exists for code deeper in the call chain.

use std::collections::BTreeSet;
use std::future::Future;

use super::claims::AuthenticatedPrincipal;

tokio::task_local! {
    static CURRENT: AuthenticationContext;
}

/// Identity resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationContext {
    /// Principal name (token subject)
    pub principal: String,
    /// Local account identifier
    pub user_id: i64,
    /// Granted authorities
    pub authorities: BTreeSet<String>,
    /// Raw token the identity was resolved from
    pub token: String,
}

impl AuthenticationContext {
    pub fn new(
        principal: impl Into<String>,
        user_id: i64,
        authorities: BTreeSet<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            user_id,
            authorities,
            token: token.into(),
        }
    }

    /// Context for a principal that passed token validation.
    pub fn from_principal(principal: AuthenticatedPrincipal, token: impl Into<String>) -> Self {
        Self {
            principal: principal.username,
            user_id: principal.user_id,
            authorities: principal.authorities,
            token: token.into(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    /// Run `fut` with this context installed.
    ///
    /// The context is removed on every exit path of `fut`, including unwinding
    /// and cancellation.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, fut).await
    }

    /// The context installed for the running request, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(Clone::clone).ok()
    }
}
