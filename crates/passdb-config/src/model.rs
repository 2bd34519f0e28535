// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for passdb.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level passdb configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PassdbConfig {
    /// Vault location and index settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Password generator settings.
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// How names are mapped to record files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Encrypted `lookup.<ext>` table maintained on every add.
    #[default]
    Persisted,
    /// Built from the directory listing; names are the file stems.
    Derived,
}

/// Vault storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Directory holding the record files.
    #[serde(default = "default_vault_dir")]
    pub dir: String,

    /// File extension of record files and of the lookup file, without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Lookup index strategy.
    #[serde(default)]
    pub index: IndexMode,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            dir: default_vault_dir(),
            extension: default_extension(),
            index: IndexMode::default(),
        }
    }
}

fn default_vault_dir() -> String {
    "./creds.d".to_string()
}

fn default_extension() -> String {
    "json.enc".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for the passdb crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Password generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateConfig {
    /// Number of characters in a generated password.
    #[serde(default = "default_length")]
    pub length: usize,

    /// Characters a generated password is drawn from.
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            length: default_length(),
            alphabet: default_alphabet(),
        }
    }
}

fn default_length() -> usize {
    12
}

fn default_alphabet() -> String {
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()".to_string()
}
