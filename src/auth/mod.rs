// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Request-time authentication for the API.
//!
//! ## Auth Flow
//!
//! 1. Client obtains a token (password login or Google sign-in) delivered in
//!    the HTTP-only `access_token` cookie
//! 2. Client sends the cookie, `Authorization: Bearer <token>`, or the raw
//!    token in `X-Gateway-Authorization`
//! 3. The authentication filter:
//!    - lets public routes through untouched
//!    - verifies the HMAC signature and expiry
//!    - extracts `sub`, `userId` and the authorities claim
//!    - installs the [`AuthenticationContext`] for the rest of the request
//!
//! ## Security
//!
//! - Every route outside the public patterns requires a valid token
//! - Signing key is decoded once at startup and must be at least 256 bits
//! - No clock skew tolerance; expiry is compared with millisecond precision
//! - Clients never learn why a token was rejected, only that it was

pub mod claims;
pub mod context;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod patterns;
pub mod roles;
pub mod token;

pub use claims::AuthenticatedPrincipal;
pub use context::AuthenticationContext;
pub use cookie::{CookieSettings, TokenCookie};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use middleware::{authentication_filter, AuthenticationFilter, FilterDecision};
pub use patterns::{RoutePatterns, RouteSource};
pub use roles::Role;
pub use token::{SigningKey, TokenCodec, TokenLifetime, TokenValidator, TokenValidity};
