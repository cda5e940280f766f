// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AdminOnly, Auth, AuthError, AuthenticationContext};
use crate::error::ApiError;
use crate::i18n::keys;
use crate::models::{AccountResponse, BaseResponse};
use crate::state::AppState;

/// Response for GET /api/users/me
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserMeResponse {
    /// Principal name (token subject)
    pub username: String,
    /// Local account id
    pub user_id: i64,
    /// Granted authorities
    pub authorities: Vec<String>,
}

impl From<AuthenticationContext> for UserMeResponse {
    fn from(context: AuthenticationContext) -> Self {
        Self {
            username: context.principal,
            user_id: context.user_id,
            authorities: context.authorities.into_iter().collect(),
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = []), ("cookie" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 400, description = "No token supplied", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid or expired token", body = crate::error::ErrorBody),
    )
)]
pub async fn get_current_user(Auth(context): Auth) -> Json<UserMeResponse> {
    Json(context.into())
}

/// Get an account by id. Requires `ROLE_ADMIN`.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer" = []), ("cookie" = [])),
    params(("id" = i64, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account information", body = BaseResponse<AccountResponse>),
        (status = 401, description = "Invalid or expired token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an administrator", body = crate::error::ErrorBody),
        (status = 404, description = "Account does not exist", body = crate::error::ErrorBody),
    )
)]
pub async fn get_account(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BaseResponse<AccountResponse>>, ApiError> {
    tracing::debug!(admin = %admin.principal, account_id = id, "account lookup");

    let account = state
        .accounts
        .find_by_id(id)
        .await
        .map_err(|e| state.translator.translate(&AuthError::from(e)))?
        .ok_or_else(|| {
            ApiError::not_found(state.translator.message(keys::ACCOUNT_NOT_FOUND, &[id.to_string()]))
        })?;

    Ok(Json(BaseResponse::ok(
        state.translator.message(keys::REQUEST_SUCCESS, &[]),
        account.into(),
    )))
}
