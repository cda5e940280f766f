// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::accounts::AccountService;
use crate::auth::cookie::CookieSettings;
use crate::auth::middleware::AuthenticationFilter;
use crate::auth::token::TokenCodec;
use crate::config::{ConfigError, SecurityConfig};
use crate::error::ExceptionTranslator;
use crate::i18n::MessageTranslator;
use crate::oauth2::{FederatedSignInFlow, OAuth2Provider};

/// Shared, read-only application state.
///
/// Everything here is built once at startup; request handling only reads it.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub filter: AuthenticationFilter,
    pub translator: ExceptionTranslator,
    pub accounts: AccountService,
    pub cookies: CookieSettings,
    /// `None` when federated sign-in is disabled
    pub sign_in: Option<FederatedSignInFlow>,
}

impl AppState {
    /// Decode the signing key and compile the public routes.
    pub fn new(
        security: &SecurityConfig,
        accounts: AccountService,
        messages: Arc<dyn MessageTranslator>,
    ) -> Result<Self, ConfigError> {
        let codec = Arc::new(TokenCodec::new(&security.signing_key()?, security.validity));
        let routes = Arc::new(security.route_patterns()?);
        let translator = ExceptionTranslator::new(messages);
        let filter = AuthenticationFilter::new(codec.clone(), routes, translator.clone());

        Ok(Self {
            codec,
            filter,
            translator,
            accounts,
            cookies: security.cookie,
            sign_in: None,
        })
    }

    /// Enable federated sign-in through `provider`.
    pub fn with_sign_in(mut self, provider: Arc<dyn OAuth2Provider>) -> Self {
        self.sign_in = Some(FederatedSignInFlow::new(
            provider,
            self.accounts.clone(),
            self.codec.clone(),
            self.cookies,
            self.translator.clone(),
        ));
        self
    }
}
