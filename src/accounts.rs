// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account Service
//!
//! Account lookup, creation and password login on top of an
//! [`AccountRepository`]. Persistence is external; [`crate::store`] ships an
//! in-memory repository.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::password::PasswordHasher;
use crate::auth::roles::ROLE_USER;
use crate::auth::AuthError;
use crate::i18n::keys;
use crate::models::{Account, NewAccount, SYSTEM_ACTOR};

/// Account persistence and service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("account already exists: {0}")]
    AlreadyExists(String),

    #[error("e-mail already registered: {0}")]
    EmailTaken(String),

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("account storage failed: {0}")]
    Storage(String),
}

impl From<AccountError> for AuthError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::AlreadyExists(username) => {
                AuthError::bad_request(keys::ACCOUNT_EXISTED).with_args([username])
            }
            AccountError::EmailTaken(email) => {
                AuthError::bad_request(keys::ACCOUNT_EXISTED).with_args([email])
            }
            AccountError::NotFound(username) => {
                AuthError::bad_request(keys::ACCOUNT_NOT_FOUND).with_args([username])
            }
            AccountError::InvalidCredentials => AuthError::authentication(keys::BAD_CREDENTIALS),
            AccountError::Hashing(_) | AccountError::Storage(_) => AuthError::internal(e.to_string()),
        }
    }
}

/// Persistence of accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError>;

    /// Case-insensitive e-mail lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AccountError>;

    async fn exists_by_id(&self, id: i64) -> Result<bool, AccountError>;

    /// Persist a new account and assign its id.
    ///
    /// Fails with [`AccountError::AlreadyExists`] when the username is taken
    /// and with [`AccountError::EmailTaken`] when another account already
    /// holds the e-mail (case-insensitive). Both checks and the write are one
    /// atomic step.
    async fn insert(&self, account: NewAccount) -> Result<Account, AccountError>;

    /// Overwrite an existing account.
    async fn save(&self, account: Account) -> Result<Account, AccountError>;
}

/// Account operations used by login, sign-up and the federated sign-in flow.
///
/// Password hashing and verification run on the blocking thread pool.
#[derive(Clone)]
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repository, hasher }
    }

    /// Create an account holding `ROLE_USER`.
    pub async fn create_user_account(
        &self,
        username: &str,
        raw_password: &str,
        email: Option<String>,
    ) -> Result<Account, AccountError> {
        self.create_account(
            username,
            raw_password,
            email,
            BTreeSet::from([ROLE_USER.to_string()]),
        )
        .await
    }

    /// Create an account with explicit authorities.
    pub async fn create_account(
        &self,
        username: &str,
        raw_password: &str,
        email: Option<String>,
        authorities: BTreeSet<String>,
    ) -> Result<Account, AccountError> {
        let username = username.trim();
        if self.repository.find_by_username(username).await?.is_some() {
            return Err(AccountError::AlreadyExists(username.to_string()));
        }

        let hasher = self.hasher.clone();
        let raw_password = raw_password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&raw_password))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        let account = self
            .repository
            .insert(NewAccount {
                username: username.to_string(),
                email: email.map(|e| e.trim().to_lowercase()),
                password_hash,
                authorities,
                created_by: SYSTEM_ACTOR.to_string(),
            })
            .await?;

        tracing::info!(user_id = account.id, username = %account.username, "account created");
        Ok(account)
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<Account, AccountError> {
        let account = self
            .repository
            .find_by_username(username.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let hasher = self.hasher.clone();
        let raw_password = raw_password.to_owned();
        let password_hash = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&raw_password, &password_hash))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        if !verified {
            tracing::debug!(username = %account.username, "password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(account)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        self.repository.find_by_email(email.trim()).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        self.repository.find_by_username(username).await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AccountError> {
        self.repository.find_by_id(id).await
    }

    pub async fn exists_by_id(&self, id: i64) -> Result<bool, AccountError> {
        self.repository.exists_by_id(id).await
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2Hasher;
    use crate::auth::roles::ROLE_ADMIN;
    use crate::store::InMemoryAccountStore;

    fn service() -> AccountService {
        AccountService::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(Argon2Hasher::default()),
        )
    }

    #[tokio::test]
    async fn create_user_account_assigns_role_user() {
        let accounts = service();
        let account = accounts
            .create_user_account("alice", "pw-123456", Some("Alice@Example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(account.username, "alice");
        assert_eq!(account.email.as_deref(), Some("alice@example.com"));
        assert_eq!(account.authorities, BTreeSet::from([ROLE_USER.to_string()]));
        assert_ne!(account.password_hash, "pw-123456");
        assert!(accounts.exists_by_id(account.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let accounts = service();
        accounts.create_user_account("alice", "a", None).await.unwrap();
        let err = accounts.create_user_account("alice", "b", None).await.unwrap_err();
        assert_eq!(err, AccountError::AlreadyExists("alice".to_string()));

        let auth: AuthError = err.into();
        assert_eq!(auth.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let accounts = service();
        accounts
            .create_account(
                "root",
                "s3cret",
                None,
                BTreeSet::from([ROLE_ADMIN.to_string(), ROLE_USER.to_string()]),
            )
            .await
            .unwrap();

        let account = accounts.authenticate("root", "s3cret").await.unwrap();
        assert!(account.authorities.contains(ROLE_ADMIN));

        assert_eq!(
            accounts.authenticate("root", "wrong").await.unwrap_err(),
            AccountError::InvalidCredentials
        );
        assert_eq!(
            accounts.authenticate("nobody", "s3cret").await.unwrap_err(),
            AccountError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn find_by_email_is_case_insensitive() {
        let accounts = service();
        let created = accounts
            .create_user_account("bob", "pw", Some("bob@example.com".to_string()))
            .await
            .unwrap();

        let found = accounts.find_by_email("BOB@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(created.id));
        assert!(accounts.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let accounts = service();
        accounts
            .create_user_account("carol", "pw", Some("carol@example.com".to_string()))
            .await
            .unwrap();

        let err = accounts
            .create_user_account("carol2", "pw", Some("Carol@Example.com".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::EmailTaken("carol@example.com".to_string()));
    }

    #[derive(Default)]
    struct ThreadRecordingHasher {
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl PasswordHasher for ThreadRecordingHasher {
        fn hash(&self, raw: &str) -> Result<String, crate::auth::password::PasswordHashError> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(format!("plain:{raw}"))
        }

        fn verify(&self, raw: &str, hash: &str) -> bool {
            self.threads.lock().unwrap().push(std::thread::current().id());
            hash == format!("plain:{raw}")
        }
    }

    #[tokio::test]
    async fn hashing_runs_off_the_async_worker() {
        let hasher = Arc::new(ThreadRecordingHasher::default());
        let accounts = AccountService::new(Arc::new(InMemoryAccountStore::new()), hasher.clone());

        accounts.create_user_account("dave", "pw", None).await.unwrap();
        accounts.authenticate("dave", "pw").await.unwrap();

        let worker = std::thread::current().id();
        let threads = hasher.threads.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != worker));
    }

    #[test]
    fn error_classification() {
        let invalid: AuthError = AccountError::InvalidCredentials.into();
        assert_eq!(invalid.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let storage: AuthError = AccountError::Storage("disk".to_string()).into();
        assert!(matches!(storage, AuthError::Internal(_)));
    }
}
