// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential data model.
//!
//! Field names on the wire are fixed (`Creds`, `User`, `Pass`, `Meta`, `Type`,
//! `URL`) so existing vaults stay readable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One login secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "User", default)]
    pub user: String,
    #[serde(rename = "Pass", default)]
    pub pass: String,
    #[serde(rename = "Meta", default)]
    pub meta: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "URL", default)]
    pub url: String,
}

impl Credential {
    /// Credential with the three fields the interactive commands ask for.
    pub fn new(user: impl Into<String>, pass: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            meta: meta.into(),
            ..Self::default()
        }
    }
}

// Keeps passwords out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("meta", &self.meta)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .finish()
    }
}

/// Ordered credentials stored under one name, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCollection {
    #[serde(rename = "Creds", default, deserialize_with = "null_as_empty")]
    pub creds: Vec<Credential>,
}

impl CredentialCollection {
    /// Collection holding exactly one credential.
    pub fn single(cred: Credential) -> Self {
        Self { creds: vec![cred] }
    }

    pub fn push(&mut self, cred: Credential) {
        self.creds.push(cred);
    }

    pub fn len(&self) -> usize {
        self.creds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creds.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.creds.iter()
    }
}

impl<'a> IntoIterator for &'a CredentialCollection {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.creds.iter()
    }
}

/// Older writers emitted `"Creds": null` for an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Credential>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Credential>>::deserialize(deserializer)?.unwrap_or_default())
}
