// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Random credentials for accounts created by federated sign-in.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated usernames and passwords.
pub const GENERATED_CREDENTIAL_LENGTH: usize = 8;

const USERNAME_LEADING: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const USERNAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Lowercase alphanumeric username starting with a letter.
pub fn generate_username(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|i| {
            let alphabet = if i == 0 { USERNAME_LEADING } else { USERNAME_ALPHABET };
            alphabet[rng.gen_range(0..alphabet.len())] as char
        })
        .collect()
}

/// Mixed-case alphanumeric password.
pub fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
