// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Hashes and verifies account passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, raw: &str) -> Result<String, PasswordHashError>;

    /// `false` for a wrong password as well as for an unreadable hash.
    fn verify(&self, raw: &str, hash: &str) -> bool;
}

/// Argon2id with default parameters, PHC string output.
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> Result<String, PasswordHashError> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| PasswordHashError(e.to_string()))?;

        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordHashError(e.to_string()))
    }

    fn verify(&self, raw: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    }
}
