// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth Gateway - Request Authentication Pipeline
//!
//! Authenticates every request to an Axum service with a signed bearer
//! token, lets configured public routes through, and makes the caller's
//! identity available to handlers for the lifetime of the request.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and the request pipeline (Axum)
//! - `auth` - Token codec, route patterns, authentication filter and context
//! - `oauth2` - Google authorization-code sign-in
//! - `accounts` / `store` - Local accounts and their in-memory repository
//! - `error` / `i18n` - Failure translation and localized messages

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod oauth2;
pub mod state;
pub mod store;
