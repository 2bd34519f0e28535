// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random password generation.

use passdb_core::PassdbError;
use rand::Rng;
use rand::rngs::OsRng;
use secrecy::SecretString;

/// Characters used when no alphabet is configured.
pub const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()";

/// Length used when none is configured.
pub const DEFAULT_LENGTH: usize = 12;

/// Draw `length` characters uniformly from `alphabet` using the OS RNG.
pub fn generate_password(length: usize, alphabet: &str) -> Result<SecretString, PassdbError> {
    let chars: Vec<char> = alphabet.chars().collect();
    if chars.is_empty() {
        return Err(PassdbError::Config(
            "password alphabet must not be empty".to_string(),
        ));
    }
    if length == 0 {
        return Err(PassdbError::Config(
            "password length must be at least 1".to_string(),
        ));
    }

    let mut rng = OsRng;
    let password: String = (0..length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect();
    Ok(SecretString::from(password))
}
