// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password login and logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AuthError, TokenCookie, TokenLifetime};
use crate::error::ApiError;
use crate::i18n::keys;
use crate::models::{BaseResponse, LoginRequest, StatusResponse};
use crate::state::AppState;

/// Result of a successful login.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub user_id: i64,
    pub authorities: Vec<String>,
    /// Same token as the cookie, for clients that send `Authorization`
    pub access_token: String,
}

/// Log in with username and password.
///
/// Sets the HTTP-only `access_token` cookie.
#[utoipa::path(
    post,
    path = "/api/p/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = BaseResponse<LoginResponse>),
        (status = 400, description = "Username or password missing", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let translate = |e: AuthError| state.translator.translate(&e);

    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(translate(AuthError::bad_request(keys::BAD_CREDENTIALS)));
    }

    let account = state
        .accounts
        .authenticate(&request.username, &request.password)
        .await
        .map_err(|e| translate(e.into()))?;

    let lifetime = if request.remember_me {
        TokenLifetime::RememberMe
    } else {
        TokenLifetime::Normal
    };

    let token = state
        .codec
        .create_token_for(
            &account.username,
            account.id,
            &account.authorities,
            request.device_id.as_deref(),
            lifetime,
        )
        .map_err(|e| translate(e.classify()))?;

    let cookie = TokenCookie::new(
        token.clone(),
        state.codec.validity().duration(lifetime),
        state.cookies,
    );

    tracing::info!(user_id = account.id, username = %account.username, remember_me = request.remember_me, "login succeeded");

    let body = BaseResponse::ok(
        state.translator.message(keys::LOGIN_SUCCESS, &[]),
        LoginResponse {
            username: account.username,
            user_id: account.id,
            authorities: account.authorities.into_iter().collect(),
            access_token: token,
        },
    );

    let mut response = (StatusCode::OK, Json(body)).into_response();
    cookie.apply(&mut response).map_err(translate)?;
    Ok(response)
}

/// Log out by clearing the token cookie.
#[utoipa::path(
    post,
    path = "/api/p/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Cookie cleared", body = StatusResponse),
    )
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = StatusResponse::new(
        StatusCode::OK,
        state.translator.message(keys::LOGOUT_SUCCESS, &[]),
    );

    let mut response = (StatusCode::OK, Json(body)).into_response();
    TokenCookie::cleared(state.cookies)
        .apply(&mut response)
        .map_err(|e| state.translator.translate(&e))?;
    Ok(response)
}
