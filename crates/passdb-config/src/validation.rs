// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::PassdbConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Generated passwords shorter than this are rejected.
pub const MIN_GENERATE_LENGTH: usize = 8;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &PassdbConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.vault.dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.dir must not be empty".to_string(),
        });
    }

    let ext = config.vault.extension.as_str();
    if ext.is_empty() {
        errors.push(ConfigError::Validation {
            message: "vault.extension must not be empty".to_string(),
        });
    } else if ext.starts_with('.') || ext.contains(['/', '\\']) {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.extension `{ext}` must not start with a dot or contain path separators"
            ),
        });
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` must be one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.generate.length < MIN_GENERATE_LENGTH {
        errors.push(ConfigError::Validation {
            message: format!(
                "generate.length must be at least {MIN_GENERATE_LENGTH}, got {}",
                config.generate.length
            ),
        });
    }

    let mut seen = HashSet::new();
    let distinct = config
        .generate
        .alphabet
        .chars()
        .filter(|c| seen.insert(*c))
        .count();
    if distinct < 2 {
        errors.push(ConfigError::Validation {
            message: "generate.alphabet must contain at least two distinct characters".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
