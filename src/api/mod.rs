// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authentication_filter, middleware::ACCESS_TOKEN_COOKIE},
    error::ErrorBody,
    models::{AccountResponse, LoginRequest, StatusResponse},
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod oauth2;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        // Public
        .route("/api/p/health", get(health::health))
        .route("/api/p/login", post(auth::login))
        .route("/api/p/logout", post(auth::logout))
        .route("/api/p/oauth2/authorize/google", get(oauth2::authorize_google))
        .route(
            "/api/p/callback/oauth2/google/authenticate",
            get(oauth2::google_callback),
        )
        // Authenticated
        .route("/api/users/me", get(users::get_current_user))
        .route("/api/users/{id}", get(users::get_account))
        .with_state(state.clone());

    let app = routes.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    with_pipeline(app, &state)
}

/// Wrap `app` in the request pipeline.
///
/// Outermost first: request id, tracing, panic guard, authentication filter.
fn with_pipeline(app: Router, state: &AppState) -> Router {
    let translator = state.translator.clone();

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(move |_: Box<dyn Any + Send + 'static>| {
                tracing::error!("request handler panicked");
                translator.internal_error().into_response()
            }))
            .layer(from_fn_with_state(state.filter.clone(), authentication_filter)),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        auth::logout,
        oauth2::authorize_google,
        oauth2::google_callback,
        users::get_current_user,
        users::get_account
    ),
    components(
        schemas(
            ErrorBody,
            StatusResponse,
            LoginRequest,
            auth::LoginResponse,
            users::UserMeResponse,
            AccountResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Authentication", description = "Password login and logout"),
        (name = "OAuth2", description = "Google sign-in"),
        (name = "Users", description = "Authenticated user endpoints")
    )
)]
struct ApiDoc;

/// Registers the two ways a token can be presented.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(ACCESS_TOKEN_COOKIE))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{roles::ROLE_ADMIN, roles::ROLE_USER, AuthenticationContext, TokenLifetime};
    use crate::models::Account;
    use crate::state::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
            Request, StatusCode,
        },
        response::Response,
    };
    use serde_json::Value;
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    fn token_for(state: &AppState, account: &Account) -> String {
        state
            .codec
            .create_token_for(
                &account.username,
                account.id,
                &account.authorities,
                None,
                TokenLifetime::Normal,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(test_state());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = router(test_state()).oneshot(get("/api/p/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["oauth2"], false);
    }

    #[tokio::test]
    async fn openapi_document_is_public() {
        let response = router(test_state())
            .oneshot(get("/api-doc/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/users/me"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer"].is_object());
        assert!(body["components"]["securitySchemes"]["cookie"].is_object());
    }

    #[tokio::test]
    async fn protected_route_without_token_is_bad_request() {
        let response = router(test_state()).oneshot(get("/api/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn protected_route_with_garbage_token_is_unauthorized() {
        let response = router(test_state())
            .oneshot(get_with_bearer("/api/users/me", "not.a.token"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_then_cookie_authenticates() {
        let state = test_state();
        state
            .accounts
            .create_user_account("alice", "correct horse", None)
            .await
            .unwrap();
        let app = router(state);

        let login = Request::builder()
            .method("POST")
            .uri("/api/p/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"alice","password":"correct horse"}"#))
            .unwrap();
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["username"], "alice");

        let me = Request::builder()
            .uri("/api/users/me")
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(me).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["authorities"][0], ROLE_USER);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let state = test_state();
        state
            .accounts
            .create_user_account("alice", "correct horse", None)
            .await
            .unwrap();

        let login = Request::builder()
            .method("POST")
            .uri("/api/p/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"alice","password":"battery staple"}"#))
            .unwrap();
        let response = router(state).oneshot(login).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/p/logout")
            .body(Body::empty())
            .unwrap();
        let response = router(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn account_lookup_requires_admin() {
        let state = test_state();
        let user = state
            .accounts
            .create_user_account("bob", "pw", None)
            .await
            .unwrap();
        let admin = state
            .accounts
            .create_account(
                "root",
                "pw",
                None,
                BTreeSet::from([ROLE_ADMIN.to_string(), ROLE_USER.to_string()]),
            )
            .await
            .unwrap();
        let user_token = token_for(&state, &user);
        let admin_token = token_for(&state, &admin);
        let app = router(state);

        let uri = format!("/api/users/{}", user.id);
        let response = app
            .clone()
            .oneshot(get_with_bearer(&uri, &user_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(get_with_bearer(&uri, &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"]["username"], "bob");

        let response = app
            .oneshot(get_with_bearer("/api/users/9999", &admin_token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn google_sign_in_disabled_is_bad_request() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(get("/api/p/oauth2/authorize/google"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(get("/api/p/callback/oauth2/google/authenticate?code=abc&state=xyz"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_do_not_share_identity() {
        let state = test_state();
        let alice = state
            .accounts
            .create_user_account("alice", "pw", None)
            .await
            .unwrap();
        let token = token_for(&state, &alice);
        let app = router(state);

        let (authenticated, anonymous) = tokio::join!(
            app.clone().oneshot(get_with_bearer("/api/users/me", &token)),
            app.clone().oneshot(get("/api/users/me")),
        );

        assert_eq!(authenticated.unwrap().status(), StatusCode::OK);
        assert_eq!(anonymous.unwrap().status(), StatusCode::BAD_REQUEST);
        assert!(AuthenticationContext::current().is_none());
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        async fn explode() -> &'static str {
            panic!("boom")
        }

        let state = test_state();
        let app = Router::new().route("/api/p/explode", axum::routing::get(explode));
        let app = with_pipeline(app, &state);

        let response = app.oneshot(get("/api/p/explode")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal server error");
    }
}
