// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Google OAuth2 client (authorization-code grant, client side only).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::OAuth2Config;

#[derive(Debug, thiserror::Error)]
pub enum OAuth2Error {
    #[error("OAuth2 client configuration invalid: {0}")]
    Config(String),

    #[error("OAuth2 code exchange failed: {0}")]
    Exchange(String),

    #[error("OAuth2 user info request failed: {0}")]
    UserInfo(String),

    #[error("OAuth2 provider response was invalid: {0}")]
    InvalidResponse(String),
}

/// Token endpoint response.
#[derive(Clone, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl std::fmt::Debug for ProviderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print provider tokens
        f.debug_struct("ProviderToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// OpenID Connect user info.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderUserInfo {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Client side of an OAuth2 authorization-code exchange.
#[async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// Registration id used in routes and messages (e.g. `google`).
    fn registration_id(&self) -> &str;

    /// Consent page URL the browser is redirected to.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, OAuth2Error>;

    /// Fetch the profile of the token's owner.
    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderUserInfo, OAuth2Error>;
}

#[derive(Debug, Clone)]
pub struct GoogleOAuth2Client {
    config: OAuth2Config,
    authorization_uri: Url,
    http: Client,
}

impl GoogleOAuth2Client {
    pub fn new(config: OAuth2Config) -> Result<Self, OAuth2Error> {
        let authorization_uri = Url::parse(&config.authorization_uri)
            .map_err(|e| OAuth2Error::Config(format!("authorization URI: {e}")))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OAuth2Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            authorization_uri,
            http,
        })
    }
}

#[async_trait]
impl OAuth2Provider for GoogleOAuth2Client {
    fn registration_id(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorization_uri.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("access_type", "offline");
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, OAuth2Error> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuth2Error::Exchange(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::Exchange(format!(
                "token request returned {status}: {body}"
            )));
        }

        let token: ProviderToken = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidResponse(format!("invalid token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(OAuth2Error::InvalidResponse(
                "token response did not include access_token".to_string(),
            ));
        }

        Ok(token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderUserInfo, OAuth2Error> {
        let response = self
            .http
            .get(&self.config.user_info_uri)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuth2Error::UserInfo(format!("GET user info failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuth2Error::UserInfo(format!(
                "GET user info returned {status}: {body}"
            )));
        }

        let info: ProviderUserInfo = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidResponse(format!("invalid user info: {e}")))?;

        if info.email.trim().is_empty() {
            return Err(OAuth2Error::InvalidResponse(
                "user info did not include an e-mail".to_string(),
            ));
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> OAuth2Config {
        OAuth2Config {
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            redirect_uri: "https://app.example.com/api/p/callback/oauth2/google/authenticate".to_string(),
            scopes: vec!["openid".to_string(), "email".to_string()],
            authorization_uri: format!("{}/auth", server.uri()),
            token_uri: format!("{}/token", server.uri()),
            user_info_uri: format!("{}/userinfo", server.uri()),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn authorization_url_carries_client_settings() {
        let server = MockServer::start().await;
        let client = GoogleOAuth2Client::new(config(&server)).unwrap();

        let url = Url::parse(&client.authorization_url("xyz")).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/auth");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "client-1");
        assert_eq!(params["scope"], "openid email");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["access_type"], "offline");
        assert!(params["redirect_uri"].ends_with("/google/authenticate"));
    }

    #[tokio::test]
    async fn exchange_code_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "provider-token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        let token = client.exchange_code("auth-code").await.unwrap();
        assert_eq!(token.access_token, "provider-token");
        assert_eq!(token.expires_in, Some(3599));
        assert!(!format!("{token:?}").contains("provider-token"));
    }

    #[tokio::test]
    async fn exchange_code_propagates_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        let err = client.exchange_code("used-code").await.unwrap_err();
        assert!(matches!(err, OAuth2Error::Exchange(ref m) if m.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn exchange_code_rejects_empty_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": " "})))
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        assert!(matches!(
            client.exchange_code("c").await,
            Err(OAuth2Error::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn fetch_user_info_uses_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer provider-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "1234567890",
                "email": "alice@example.com",
                "email_verified": true,
                "name": "Alice"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        let info = client.fetch_user_info("provider-token").await.unwrap();
        assert_eq!(info.email, "alice@example.com");
        assert_eq!(info.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn fetch_user_info_fails_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        assert!(matches!(
            client.fetch_user_info("expired").await,
            Err(OAuth2Error::UserInfo(_))
        ));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = GoogleOAuth2Client::new(config(&server)).unwrap();
        assert!(matches!(
            client.exchange_code("c").await,
            Err(OAuth2Error::Exchange(_))
        ));
    }

    #[test]
    fn invalid_authorization_uri_is_rejected() {
        let mut config = OAuth2Config {
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            redirect_uri: "r".to_string(),
            scopes: Vec::new(),
            authorization_uri: "not a url".to_string(),
            token_uri: String::new(),
            user_info_uri: String::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(GoogleOAuth2Client::new(config.clone()), Err(OAuth2Error::Config(_))));

        config.authorization_uri = "https://accounts.example.com/auth".to_string();
        assert!(GoogleOAuth2Client::new(config).is_ok());
    }
}
