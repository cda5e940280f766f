// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message lookup for user-visible responses.
//!
//! Every message returned to a client is produced from a message key plus
//! optional positional arguments (`{0}`, `{1}`, ...). The translator is an
//! external collaborator; [`MessageCatalog`] is the built-in English catalog
//! used by the binary and the tests.

use std::collections::HashMap;

/// Message keys used by the authentication pipeline.
pub mod keys {
    pub const BAD_CREDENTIALS: &str = "error.auth.bad_credentials";
    pub const TOKEN_INVALID_OR_EXPIRED: &str = "error.auth.token_invalid_or_expired";
    pub const UNAUTHORIZED: &str = "error.auth.unauthorized";
    pub const FORBIDDEN: &str = "error.auth.forbidden";
    pub const ACCOUNT_NOT_FOUND: &str = "error.account.not_found";
    pub const ACCOUNT_EXISTED: &str = "error.account.existed";
    pub const ACCOUNT_NOT_EXISTED: &str = "error.account.not_existed";
    pub const OAUTH2_DISABLED: &str = "error.oauth2.disabled";
    pub const INTERNAL: &str = "error.internal";
    pub const LOGIN_SUCCESS: &str = "result.login_success";
    pub const LOGOUT_SUCCESS: &str = "result.logout_success";
    pub const REQUEST_SUCCESS: &str = "result.request_success";
}

/// Resolves a message key to a user-facing string.
pub trait MessageTranslator: Send + Sync {
    fn translate(&self, key: &str, args: &[String]) -> String;
}

/// Static key → template catalog.
///
/// Unknown keys resolve to the key itself so a missing entry never turns into
/// an empty response message.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<&'static str, &'static str>,
}

impl MessageCatalog {
    /// Empty catalog.
    pub fn empty() -> Self {
        Self {
            messages: HashMap::new(),
        }
    }

    /// Add or replace a template.
    pub fn with_message(mut self, key: &'static str, template: &'static str) -> Self {
        self.messages.insert(key, template);
        self
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::empty()
            .with_message(keys::BAD_CREDENTIALS, "Invalid credentials")
            .with_message(
                keys::TOKEN_INVALID_OR_EXPIRED,
                "Unauthorized: token is invalid or expired",
            )
            .with_message(keys::UNAUTHORIZED, "Full authentication is required")
            .with_message(keys::FORBIDDEN, "You do not have permission to access this resource")
            .with_message(keys::ACCOUNT_NOT_FOUND, "Account {0} does not exist")
            .with_message(keys::ACCOUNT_EXISTED, "Account {0} already exists")
            .with_message(keys::ACCOUNT_NOT_EXISTED, "Account {0} does not exist")
            .with_message(keys::OAUTH2_DISABLED, "Sign-in with {0} is not enabled")
            .with_message(keys::INTERNAL, "Internal server error")
            .with_message(keys::LOGIN_SUCCESS, "Login successful")
            .with_message(keys::LOGOUT_SUCCESS, "Logout successful")
            .with_message(keys::REQUEST_SUCCESS, "Request successful")
    }
}

impl MessageTranslator for MessageCatalog {
    fn translate(&self, key: &str, args: &[String]) -> String {
        let Some(template) = self.messages.get(key) else {
            return key.to_string();
        };

        args.iter()
            .enumerate()
            .fold((*template).to_string(), |message, (index, arg)| {
                message.replace(&format!("{{{index}}}"), arg)
            })
    }
}
