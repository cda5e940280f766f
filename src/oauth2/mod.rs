// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Federated Sign-In
//!
//! OAuth2 authorization-code sign-in against Google. The provider client
//! sits behind [`OAuth2Provider`]; [`FederatedSignInFlow`] turns a callback
//! code into a local account and token.

pub mod client;
pub mod credentials;
pub mod flow;

pub use client::{GoogleOAuth2Client, OAuth2Error, OAuth2Provider, ProviderToken, ProviderUserInfo};
pub use flow::{FederatedSignInFlow, SignInOutcome};
