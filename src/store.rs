// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory account repository.
//!
//! Used by the binary when no external store is configured, and by tests.
//! Contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::accounts::{AccountError, AccountRepository};
use crate::models::{Account, NewAccount};

#[derive(Default)]
struct Accounts {
    by_id: HashMap<i64, Account>,
    next_id: i64,
}

#[derive(Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Accounts>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AccountError> {
        let accounts = self.inner.read().await;
        Ok(accounts
            .by_id
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let accounts = self.inner.read().await;
        Ok(accounts
            .by_id
            .values()
            .find(|account| email_matches(account, email))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AccountError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool, AccountError> {
        Ok(self.inner.read().await.by_id.contains_key(&id))
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AccountError> {
        let mut accounts = self.inner.write().await;
        if accounts
            .by_id
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(AccountError::AlreadyExists(account.username));
        }
        if let Some(email) = account.email.as_deref() {
            if accounts.by_id.values().any(|existing| email_matches(existing, email)) {
                return Err(AccountError::EmailTaken(email.to_string()));
            }
        }

        accounts.next_id += 1;
        let now = Utc::now();
        let stored = Account {
            id: accounts.next_id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            authorities: account.authorities,
            last_modified_by: account.created_by.clone(),
            created_by: account.created_by,
            created_at: now,
            last_modified_at: now,
        };
        accounts.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, mut account: Account) -> Result<Account, AccountError> {
        let mut accounts = self.inner.write().await;
        if !accounts.by_id.contains_key(&account.id) {
            return Err(AccountError::NotFound(account.username));
        }

        account.last_modified_at = Utc::now();
        accounts.by_id.insert(account.id, account.clone());
        Ok(account)
    }
}

fn email_matches(account: &Account, email: &str) -> bool {
    account
        .email
        .as_deref()
        .is_some_and(|stored| stored.eq_ignore_ascii_case(email))
}
