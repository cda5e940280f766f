// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Federated sign-in.
//!
//! ## Flow
//!
//! 1. Callback receives the authorization `code` (blank → rejected)
//! 2. Code is exchanged for a provider access token
//! 3. The provider profile is fetched with that token
//! 4. The local account is found by e-mail, or created with a generated
//!    username and password
//! 5. An authentication context with `ROLE_USER` is built for the account
//! 6. A local token (normal lifetime) is issued and wrapped in the cookie
//!
//! No step is retried. Any failure aborts the flow and is reported to the
//! caller as an authentication failure; the cause is logged.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::StatusCode;

use super::client::{OAuth2Provider, ProviderUserInfo};
use super::credentials::{generate_password, generate_username, GENERATED_CREDENTIAL_LENGTH};
use crate::accounts::{AccountError, AccountService};
use crate::auth::context::AuthenticationContext;
use crate::auth::cookie::{CookieSettings, TokenCookie};
use crate::auth::roles::ROLE_USER;
use crate::auth::token::{TokenCodec, TokenLifetime};
use crate::auth::AuthError;
use crate::error::ExceptionTranslator;
use crate::i18n::keys;
use crate::models::{Account, StatusResponse};

/// Generated usernames that collide with an existing account are redrawn.
const MAX_USERNAME_ATTEMPTS: usize = 5;

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub context: AuthenticationContext,
    pub token: String,
    pub cookie: TokenCookie,
    pub response: StatusResponse,
}

#[derive(Clone)]
pub struct FederatedSignInFlow {
    provider: Arc<dyn OAuth2Provider>,
    accounts: AccountService,
    codec: Arc<TokenCodec>,
    cookies: CookieSettings,
    translator: ExceptionTranslator,
}

impl FederatedSignInFlow {
    pub fn new(
        provider: Arc<dyn OAuth2Provider>,
        accounts: AccountService,
        codec: Arc<TokenCodec>,
        cookies: CookieSettings,
        translator: ExceptionTranslator,
    ) -> Self {
        Self {
            provider,
            accounts,
            codec,
            cookies,
            translator,
        }
    }

    pub fn provider(&self) -> &dyn OAuth2Provider {
        self.provider.as_ref()
    }

    /// Complete sign-in from an authorization code.
    pub async fn authorize(&self, code: &str) -> Result<SignInOutcome, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::authentication(keys::BAD_CREDENTIALS));
        }

        tracing::debug!(provider = %self.provider.registration_id(), "exchanging authorization code");
        let token = self
            .provider
            .exchange_code(code)
            .await
            .map_err(|e| sign_in_failure("code exchange", e))?;

        let user_info = self
            .provider
            .fetch_user_info(&token.access_token)
            .await
            .map_err(|e| sign_in_failure("user info", e))?;

        self.authorize_user_info(&user_info).await
    }

    /// Complete sign-in for an already fetched provider profile.
    pub async fn authorize_user_info(&self, user_info: &ProviderUserInfo) -> Result<SignInOutcome, AuthError> {
        tracing::debug!(email = %user_info.email, "authorizing federated user");

        let account = match self
            .accounts
            .find_by_email(&user_info.email)
            .await
            .map_err(|e| sign_in_failure("account lookup", e))?
        {
            Some(account) => account,
            None => self.create_account(&user_info.email).await?,
        };

        let authorities = BTreeSet::from([ROLE_USER.to_string()]);
        let token = self
            .codec
            .create_token_for(&account.username, account.id, &authorities, None, TokenLifetime::Normal)
            .map_err(|e| sign_in_failure("token issue", e))?;

        let context = AuthenticationContext::new(account.username.clone(), account.id, authorities, token.clone());
        let cookie = TokenCookie::new(token.clone(), self.codec.validity().normal, self.cookies);
        let response = StatusResponse::new(
            StatusCode::ACCEPTED,
            self.translator.message(keys::LOGIN_SUCCESS, &[]),
        );

        tracing::info!(user_id = account.id, username = %account.username, "federated sign-in succeeded");
        Ok(SignInOutcome {
            context,
            token,
            cookie,
            response,
        })
    }

    async fn create_account(&self, email: &str) -> Result<Account, AuthError> {
        tracing::debug!(email = %email, "no account for e-mail, creating one");

        for _ in 0..MAX_USERNAME_ATTEMPTS {
            let username = generate_username(GENERATED_CREDENTIAL_LENGTH);
            let password = generate_password(GENERATED_CREDENTIAL_LENGTH);

            match self
                .accounts
                .create_user_account(&username, &password, Some(email.to_string()))
                .await
            {
                Ok(account) => return Ok(account),
                Err(AccountError::AlreadyExists(_)) => continue,
                // A concurrent sign-in for the same e-mail created it first
                Err(AccountError::EmailTaken(_)) => {
                    return self
                        .accounts
                        .find_by_email(email)
                        .await
                        .map_err(|e| sign_in_failure("account lookup", e))?
                        .ok_or_else(|| sign_in_failure("account lookup", "e-mail taken but not found"));
                }
                Err(e) => return Err(sign_in_failure("account creation", e)),
            }
        }

        Err(sign_in_failure(
            "account creation",
            "no free generated username",
        ))
    }
}

impl std::fmt::Debug for FederatedSignInFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedSignInFlow")
            .field("provider", &self.provider.registration_id())
            .finish_non_exhaustive()
    }
}

fn sign_in_failure(step: &str, cause: impl std::fmt::Display) -> AuthError {
    tracing::warn!(step, error = %cause, "federated sign-in failed");
    AuthError::authentication(keys::BAD_CREDENTIALS)
}
