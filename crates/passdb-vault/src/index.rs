// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name to storage identifier lookup.
//!
//! A record for `name` lives at `<dir>/<hex(sha256(lowercase(name)))>.<ext>`.
//! The lookup index remembers which names were stored so they can be
//! searched. [`PersistedIndex`] keeps the table in its own encrypted record
//! file, [`DerivedIndex`] rebuilds it from the directory listing on every
//! open and only knows identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use passdb_config::IndexMode;
use passdb_core::PassdbError;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::kdf::MasterSecret;
use crate::record::RecordCodec;

/// File stem of the persisted lookup table.
pub const LOOKUP_STEM: &str = "lookup";

/// Storage identifier of a name: hex SHA-256 of the lowercased name.
pub fn identifier_for(name: &str) -> String {
    hex::encode(Sha256::digest(name.to_lowercase().as_bytes()))
}

/// True for 64 lowercase hex characters.
pub fn is_identifier(candidate: &str) -> bool {
    candidate.len() == 64
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Where record files and the lookup file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLayout {
    dir: PathBuf,
    extension: String,
}

impl VaultLayout {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{identifier}.{}", self.extension))
    }

    pub fn lookup_path(&self) -> PathBuf {
        self.record_path(LOOKUP_STEM)
    }

    /// Identifiers of every record file in the directory.
    ///
    /// Skips the lookup file, hidden files (temp files and the lock file) and
    /// anything that is not a regular file with the configured extension.
    pub fn record_ids(&self) -> Result<BTreeSet<String>, PassdbError> {
        let suffix = format!(".{}", self.extension);
        let mut ids = BTreeSet::new();

        let entries = std::fs::read_dir(&self.dir).map_err(|e| PassdbError::io(&self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PassdbError::io(&self.dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| PassdbError::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(&suffix)
                && !stem.is_empty()
                && stem != LOOKUP_STEM
            {
                ids.insert(stem.to_string());
            }
        }
        Ok(ids)
    }
}

/// Maps names to storage identifiers.
pub trait LookupIndex: fmt::Debug {
    fn mode(&self) -> IndexMode;

    /// Identifier stored for `name`, if any. Names are compared lowercased.
    fn resolve(&self, name: &str) -> Option<String>;

    fn insert(&mut self, name: &str, identifier: &str);

    /// Write the index back to disk.
    fn persist(&self, secret: &MasterSecret) -> Result<(), PassdbError>;

    /// All `(name, identifier)` pairs sorted by name.
    fn entries(&self) -> Vec<(String, String)>;
}

/// Build the index selected by `mode`.
pub fn open_index(
    mode: IndexMode,
    layout: &VaultLayout,
    codec: RecordCodec,
    secret: &MasterSecret,
) -> Result<Box<dyn LookupIndex>, PassdbError> {
    match mode {
        IndexMode::Persisted => Ok(Box::new(PersistedIndex::load(
            layout.clone(),
            codec,
            secret,
        )?)),
        IndexMode::Derived => Ok(Box::new(DerivedIndex::scan(layout)?)),
    }
}

/// Encrypted `lookup.<ext>` table, rewritten in full on every persist.
#[derive(Debug)]
pub struct PersistedIndex {
    layout: VaultLayout,
    codec: RecordCodec,
    table: BTreeMap<String, String>,
}

impl PersistedIndex {
    /// Decrypt the lookup file. A missing file is an empty index.
    pub fn load(
        layout: VaultLayout,
        codec: RecordCodec,
        secret: &MasterSecret,
    ) -> Result<Self, PassdbError> {
        let path = layout.lookup_path();
        let table = match codec.read_payload::<BTreeMap<String, String>>(secret, &path) {
            Ok(table) => table,
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "no lookup file, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        debug!(entries = table.len(), "lookup index loaded");
        Ok(Self {
            layout,
            codec,
            table,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl LookupIndex for PersistedIndex {
    fn mode(&self) -> IndexMode {
        IndexMode::Persisted
    }

    fn resolve(&self, name: &str) -> Option<String> {
        self.table.get(&name.to_lowercase()).cloned()
    }

    fn insert(&mut self, name: &str, identifier: &str) {
        self.table
            .insert(name.to_lowercase(), identifier.to_string());
    }

    fn persist(&self, secret: &MasterSecret) -> Result<(), PassdbError> {
        self.codec
            .write_payload(secret, &self.layout.lookup_path(), &self.table)
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.table
            .iter()
            .map(|(name, id)| (name.clone(), id.clone()))
            .collect()
    }
}

/// Index built from the record files present when the vault was opened.
///
/// Every file stem is both name and identifier. Nothing is stored, so
/// `insert` and `persist` do nothing.
#[derive(Debug)]
pub struct DerivedIndex {
    ids: BTreeSet<String>,
}

impl DerivedIndex {
    pub fn scan(layout: &VaultLayout) -> Result<Self, PassdbError> {
        let ids = layout.record_ids()?;
        debug!(entries = ids.len(), "lookup index derived from directory");
        Ok(Self { ids })
    }
}

impl LookupIndex for DerivedIndex {
    fn mode(&self) -> IndexMode {
        IndexMode::Derived
    }

    fn resolve(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        self.ids.contains(&name).then_some(name)
    }

    fn insert(&mut self, _name: &str, _identifier: &str) {}

    fn persist(&self, _secret: &MasterSecret) -> Result<(), PassdbError> {
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.ids.iter().map(|id| (id.clone(), id.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KdfParams;

    fn codec() -> RecordCodec {
        RecordCodec::new(KdfParams::new(4, 8, 1))
    }

    fn secret() -> MasterSecret {
        MasterSecret::from(b"hunter2".to_vec())
    }

    #[test]
    fn identifier_is_case_insensitive_sha256() {
        assert_eq!(identifier_for("github"), identifier_for("GitHub"));
        // sha256("abc")
        assert_eq!(
            identifier_for("ABC"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(is_identifier(&identifier_for("aws")));
    }

    #[test]
    fn identifier_validation() {
        assert!(is_identifier(&"a".repeat(64)));
        assert!(!is_identifier(&"A".repeat(64)));
        assert!(!is_identifier(&"a".repeat(63)));
        assert!(!is_identifier(&format!("../{}", "a".repeat(61))));
    }

    #[test]
    fn layout_paths() {
        let layout = VaultLayout::new("creds.d", ".json.enc");
        assert_eq!(layout.extension(), "json.enc");
        assert_eq!(
            layout.record_path("abc"),
            Path::new("creds.d").join("abc.json.enc")
        );
        assert_eq!(
            layout.lookup_path(),
            Path::new("creds.d").join("lookup.json.enc")
        );
    }

    #[test]
    fn record_ids_skip_lookup_hidden_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VaultLayout::new(dir.path(), "json.enc");
        for name in [
            "aaa.json.enc",
            "bbb.json.enc",
            "lookup.json.enc",
            ".passdb.lock",
            ".passdb-123.tmp",
            ".hidden.json.enc",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.json.enc")).unwrap();

        let ids: Vec<_> = layout.record_ids().unwrap().into_iter().collect();
        assert_eq!(ids, vec!["aaa".to_string(), "bbb".to_string()]);
    }

    #[test]
    fn persisted_index_starts_empty_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VaultLayout::new(dir.path(), "json.enc");

        let mut index = PersistedIndex::load(layout.clone(), codec(), &secret()).unwrap();
        assert!(index.is_empty());

        index.insert("GitHub", &identifier_for("github"));
        index.insert("aws", &identifier_for("aws"));
        index.persist(&secret()).unwrap();
        assert!(layout.lookup_path().exists());

        let reloaded = PersistedIndex::load(layout, codec(), &secret()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.resolve("GITHUB"), Some(identifier_for("github")));
        let names: Vec<_> = reloaded.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["aws", "github"]);
    }

    #[test]
    fn persisted_index_rejects_wrong_secret() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VaultLayout::new(dir.path(), "json.enc");
        let mut index = PersistedIndex::load(layout.clone(), codec(), &secret()).unwrap();
        index.insert("github", &identifier_for("github"));
        index.persist(&secret()).unwrap();

        let wrong = MasterSecret::from(b"hunter3".to_vec());
        let err = PersistedIndex::load(layout, codec(), &wrong).unwrap_err();
        assert!(err.is_invalid_master_secret());
    }

    #[test]
    fn derived_index_resolves_identifiers_only() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VaultLayout::new(dir.path(), "json.enc");
        let id = identifier_for("github");
        std::fs::write(layout.record_path(&id), b"x").unwrap();

        let mut index = DerivedIndex::scan(&layout).unwrap();
        assert_eq!(index.mode(), IndexMode::Derived);
        assert_eq!(index.resolve(&id), Some(id.clone()));
        assert_eq!(index.resolve("github"), None);

        index.insert("aws", &identifier_for("aws"));
        index.persist(&secret()).unwrap();
        assert_eq!(index.entries(), vec![(id.clone(), id)]);
        assert!(!layout.lookup_path().exists());
    }

    #[test]
    fn open_index_selects_implementation() {
        let dir = tempfile::tempdir().unwrap();
        let layout = VaultLayout::new(dir.path(), "json.enc");

        let persisted = open_index(IndexMode::Persisted, &layout, codec(), &secret()).unwrap();
        assert_eq!(persisted.mode(), IndexMode::Persisted);
        let derived = open_index(IndexMode::Derived, &layout, codec(), &secret()).unwrap();
        assert_eq!(derived.mode(), IndexMode::Derived);
    }
}
