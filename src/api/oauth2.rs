// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google sign-in endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::i18n::keys;
use crate::models::{OAuth2CallbackQuery, StatusResponse};
use crate::oauth2::FederatedSignInFlow;
use crate::state::AppState;

const GOOGLE: &str = "google";

fn sign_in_flow(state: &AppState) -> Result<&FederatedSignInFlow, ApiError> {
    state.sign_in.as_ref().ok_or_else(|| {
        state
            .translator
            .translate(&AuthError::bad_request(keys::OAUTH2_DISABLED).with_args([GOOGLE.to_string()]))
    })
}

/// Redirect the browser to the Google consent page.
#[utoipa::path(
    get,
    path = "/api/p/oauth2/authorize/google",
    tag = "OAuth2",
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 400, description = "Google sign-in is disabled", body = crate::error::ErrorBody),
    )
)]
pub async fn authorize_google(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let flow = sign_in_flow(&state)?;
    let oauth_state = Uuid::new_v4().simple().to_string();
    tracing::debug!(state = %oauth_state, "redirecting to Google consent page");
    Ok(Redirect::to(&flow.provider().authorization_url(&oauth_state)))
}

/// OAuth2 callback: exchange the code and sign the user in.
///
/// Sets the HTTP-only `access_token` cookie.
#[utoipa::path(
    get,
    path = "/api/p/callback/oauth2/google/authenticate",
    tag = "OAuth2",
    params(OAuth2CallbackQuery),
    responses(
        (status = 202, description = "Signed in", body = StatusResponse),
        (status = 400, description = "Google sign-in is disabled", body = crate::error::ErrorBody),
        (status = 401, description = "Sign-in failed", body = crate::error::ErrorBody),
    )
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuth2CallbackQuery>,
) -> Result<Response, ApiError> {
    tracing::debug!(state = ?query.state, "Google sign-in callback");
    let flow = sign_in_flow(&state)?;

    let outcome = flow
        .authorize(query.code.as_deref().unwrap_or_default())
        .await
        .map_err(|e| state.translator.translate(&e))?;

    let mut response = (StatusCode::ACCEPTED, Json(outcome.response)).into_response();
    outcome
        .cookie
        .apply(&mut response)
        .map_err(|e| state.translator.translate(&e))?;
    Ok(response)
}
