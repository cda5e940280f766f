// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::BTreeSet;
use std::sync::Arc;

use auth_gateway::{
    accounts::AccountService,
    api::router,
    auth::{
        password::Argon2Hasher,
        roles::{ROLE_ADMIN, ROLE_USER},
    },
    config::{OAuth2Config, SecurityConfig, SeedAdmin, ServerConfig, LOG_FORMAT_ENV},
    i18n::MessageCatalog,
    oauth2::GoogleOAuth2Client,
    state::AppState,
    store::InMemoryAccountStore,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let server = ServerConfig::from_env().expect("Invalid server configuration");
    let security = SecurityConfig::from_env().expect("Invalid security configuration");
    let oauth2 = OAuth2Config::from_env().expect("Invalid OAuth2 configuration");
    tracing::info!(?server, ?security, "configuration loaded");

    let accounts = AccountService::new(
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(Argon2Hasher::default()),
    );

    if let Some(admin) = SeedAdmin::from_env().expect("Invalid seed admin configuration") {
        match accounts
            .create_account(
                &admin.username,
                &admin.password,
                admin.email,
                BTreeSet::from([ROLE_ADMIN.to_string(), ROLE_USER.to_string()]),
            )
            .await
        {
            Ok(account) => tracing::info!(user_id = account.id, username = %account.username, "seeded admin account"),
            Err(e) => tracing::warn!(error = %e, "failed to seed admin account"),
        }
    }

    let mut state = AppState::new(&security, accounts, Arc::new(MessageCatalog::default()))
        .expect("Failed to initialize authentication");

    match oauth2 {
        Some(config) => {
            let client = GoogleOAuth2Client::new(config).expect("Failed to build Google OAuth2 client");
            state = state.with_sign_in(Arc::new(client));
            tracing::info!("Google sign-in enabled");
        }
        None => tracing::info!("Google sign-in disabled"),
    }

    let app = router(state);

    let addr = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "auth gateway listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

/// `RUST_LOG` selects levels; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
