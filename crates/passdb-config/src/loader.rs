// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./passdb.toml` > `~/.config/passdb/passdb.toml` > `/etc/passdb/passdb.toml`
//! with environment variable overrides via `PASSDB_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::PassdbConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/passdb/passdb.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG: &str = "passdb.toml";

/// `~/.config/passdb/passdb.toml`, when a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("passdb/passdb.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/passdb/passdb.toml`
/// 3. `~/.config/passdb/passdb.toml`
/// 4. `./passdb.toml`
/// 5. `PASSDB_*` environment variables
pub fn load_config() -> Result<PassdbConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PassdbConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PassdbConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PassdbConfig, figment::Error> {
    debug!(path = %path.display(), "loading explicit config file");
    Figment::new()
        .merge(Serialized::defaults(PassdbConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    let user = user_config_path().unwrap_or_default();
    debug!(
        system = SYSTEM_CONFIG,
        user = %user.display(),
        local = LOCAL_CONFIG,
        "loading layered config"
    );
    Figment::new()
        .merge(Serialized::defaults(PassdbConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `PASSDB_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores of their own.
fn env_provider() -> Env {
    Env::prefixed("PASSDB_")
        .ignore(&["MASTER_KEY"])
        .map(|key| {
            let mapped = key
                .as_str()
                .replacen("vault_", "vault.", 1)
                .replacen("logging_", "logging.", 1)
                .replacen("generate_", "generate.", 1);
            mapped.into()
        })
}
