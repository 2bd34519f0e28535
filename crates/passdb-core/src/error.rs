// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the passdb vault.

use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by every vault operation.
///
/// No operation in the vault terminates the process; callers decide what a
/// failure means. [`PassdbError::InvalidMasterSecret`] is kept apart from
/// corruption so a caller can re-prompt instead of giving up.
#[derive(Debug, Error)]
pub enum PassdbError {
    /// A record or index file does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Authenticated decryption of an existing file failed.
    #[error("invalid master secret for {} (or the file was tampered with)", path.display())]
    InvalidMasterSecret { path: PathBuf },

    /// The file exists but its framing or payload is malformed.
    #[error("malformed file {}: {message}", path.display())]
    Format { path: PathBuf, message: String },

    /// Filesystem failure unrelated to file content.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key derivation or random number generation failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Another process holds the vault lock.
    #[error("vault is locked by another process: {}", path.display())]
    Locked { path: PathBuf },

    /// A CSV import row could not be used.
    #[error("import error on line {line}: {message}")]
    Import { line: u64, message: String },

    /// Configuration or argument errors surfaced at runtime.
    #[error("configuration error: {0}")]
    Config(String),

    /// No usable master secret could be obtained.
    #[error("master secret unavailable: {0}")]
    SecretUnavailable(String),
}

impl PassdbError {
    /// Wrap an I/O error, turning `ErrorKind::NotFound` into [`PassdbError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Shorthand for a [`PassdbError::Format`] error.
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True when the failure means the master secret was wrong.
    pub fn is_invalid_master_secret(&self) -> bool {
        matches!(self, Self::InvalidMasterSecret { .. })
    }

    /// True when the failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
