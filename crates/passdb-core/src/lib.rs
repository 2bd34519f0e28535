// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for the passdb credential vault.
//!
//! This crate holds the error taxonomy shared by every layer and the
//! credential data model that record files serialize.

pub mod error;
pub mod types;

pub use error::PassdbError;
pub use types::{Credential, CredentialCollection};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn every_variant_renders_its_context() {
        let path = PathBuf::from("creds.d/lookup.json.enc");
        let cases = [
            (
                PassdbError::NotFound { path: path.clone() },
                "not found: creds.d/lookup.json.enc",
            ),
            (
                PassdbError::InvalidMasterSecret { path: path.clone() },
                "invalid master secret for creds.d/lookup.json.enc (or the file was tampered with)",
            ),
            (
                PassdbError::Format {
                    path: path.clone(),
                    message: "truncated nonce".into(),
                },
                "malformed file creds.d/lookup.json.enc: truncated nonce",
            ),
            (
                PassdbError::Io {
                    path: path.clone(),
                    source: std::io::Error::other("disk full"),
                },
                "I/O error on creds.d/lookup.json.enc: disk full",
            ),
            (
                PassdbError::Crypto("rng failed".into()),
                "crypto error: rng failed",
            ),
            (
                PassdbError::Locked { path },
                "vault is locked by another process: creds.d/lookup.json.enc",
            ),
            (
                PassdbError::Import {
                    line: 3,
                    message: "expected at least 5 fields, found 2".into(),
                },
                "import error on line 3: expected at least 5 fields, found 2",
            ),
            (
                PassdbError::Config("bad alphabet".into()),
                "configuration error: bad alphabet",
            ),
            (
                PassdbError::SecretUnavailable("empty master secret not allowed".into()),
                "master secret unavailable: empty master secret not allowed",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
