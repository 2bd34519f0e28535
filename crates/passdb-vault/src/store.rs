// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential store over a directory of record files.
//!
//! The store owns the vault lock and the lookup index for its lifetime.
//! Every mutation writes the record file first and the index second, each
//! with a fresh nonce. A crash between the two leaves a record that is not
//! indexed; [`VaultStore::verify`] reports it and [`VaultStore::load`] can
//! still read it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use passdb_config::{IndexMode, PassdbConfig};
use passdb_core::{Credential, CredentialCollection, PassdbError};
use tracing::{debug, info, warn};

use crate::import::ImportRow;
use crate::index::{self, LookupIndex, VaultLayout};
use crate::kdf::{KdfParams, MasterSecret};
use crate::lock::VaultLock;
use crate::record::RecordCodec;

/// Where and how to open a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub dir: PathBuf,
    pub extension: String,
    pub index: IndexMode,
    pub kdf: KdfParams,
}

impl StoreOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let defaults = PassdbConfig::default();
        Self {
            dir: dir.into(),
            extension: defaults.vault.extension,
            index: defaults.vault.index,
            kdf: KdfParams::STANDARD,
        }
    }

    pub fn from_config(config: &PassdbConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.vault.dir),
            extension: config.vault.extension.clone(),
            index: config.vault.index,
            kdf: KdfParams::STANDARD,
        }
    }

    pub fn with_index(mut self, index: IndexMode) -> Self {
        self.index = index;
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

/// An index entry whose record file is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEntry {
    pub name: String,
    pub identifier: String,
}

/// A record file no index entry points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanRecord {
    pub identifier: String,
}

/// Result of [`VaultStore::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub dangling: Vec<DanglingEntry>,
    pub orphans: Vec<OrphanRecord>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.orphans.is_empty()
    }
}

/// An open vault.
#[derive(Debug)]
pub struct VaultStore {
    layout: VaultLayout,
    codec: RecordCodec,
    index: Box<dyn LookupIndex>,
    _lock: VaultLock,
}

impl VaultStore {
    /// Open (creating if needed) the vault directory, take the vault lock and
    /// load the configured index.
    ///
    /// Fails with [`PassdbError::InvalidMasterSecret`] when `secret` does not
    /// decrypt the persisted index or, when there is no lookup file to check
    /// it against, the first record file.
    pub fn open(options: &StoreOptions, secret: &MasterSecret) -> Result<Self, PassdbError> {
        create_vault_dir(&options.dir)?;
        let lock = VaultLock::acquire(&options.dir)?;

        let layout = VaultLayout::new(&options.dir, options.extension.as_str());
        let codec = RecordCodec::new(options.kdf);
        let index = index::open_index(options.index, &layout, codec, secret)?;
        let index_checked_secret =
            index.mode() == IndexMode::Persisted && layout.lookup_path().exists();
        if !index_checked_secret {
            check_secret_against_record(&layout, codec, secret)?;
        }

        info!(
            dir = %options.dir.display(),
            index = ?options.index,
            "vault opened"
        );
        Ok(Self {
            layout,
            codec,
            index,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        self.layout.dir()
    }

    pub fn index_mode(&self) -> IndexMode {
        self.index.mode()
    }

    /// All `(name, identifier)` index entries sorted by name.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.index.entries()
    }

    /// Store `credential` under `name`.
    ///
    /// With `overwrite` the record becomes exactly `[credential]` and the
    /// credentials it held before are returned; otherwise `credential` is
    /// appended and nothing is returned. An existing record that cannot be
    /// read aborts the add before anything is written.
    pub fn add(
        &mut self,
        name: &str,
        secret: &MasterSecret,
        credential: Credential,
        overwrite: bool,
    ) -> Result<Vec<Credential>, PassdbError> {
        let name = name.to_lowercase();
        let identifier = index::identifier_for(&name);
        let path = self.layout.record_path(&identifier);

        let mut collection = match self.codec.read_record(secret, &path) {
            Ok(collection) => collection,
            Err(e) if e.is_not_found() => CredentialCollection::default(),
            Err(e) => return Err(e),
        };

        let replaced = if overwrite {
            std::mem::take(&mut collection.creds)
        } else {
            Vec::new()
        };
        collection.push(credential);

        self.codec.write_record(secret, &path, &collection)?;
        self.index.insert(&name, &identifier);
        self.index.persist(secret)?;

        info!(
            name = %name,
            entries = collection.len(),
            replaced = replaced.len(),
            "credential stored"
        );
        Ok(replaced)
    }

    /// Decrypt the record with the given identifier.
    pub fn read(
        &self,
        identifier: &str,
        secret: &MasterSecret,
    ) -> Result<CredentialCollection, PassdbError> {
        let path = self.layout.record_path(identifier);
        debug!(path = %path.display(), "reading record");
        self.codec.read_record(secret, &path)
    }

    /// Decrypt the record for `name`.
    ///
    /// The index resolves the name first (in derived mode that accepts an
    /// identifier as printed by [`VaultStore::find`]); names it does not know
    /// fall back to their hashed identifier, so unindexed records stay
    /// readable.
    pub fn get(
        &self,
        name: &str,
        secret: &MasterSecret,
    ) -> Result<CredentialCollection, PassdbError> {
        let identifier = self
            .index
            .resolve(name)
            .unwrap_or_else(|| index::identifier_for(name));
        self.read(&identifier, secret)
    }

    /// Decrypt a record by raw identifier. Anything other than 64 lowercase
    /// hex characters is [`PassdbError::NotFound`].
    pub fn load(
        &self,
        identifier: &str,
        secret: &MasterSecret,
    ) -> Result<CredentialCollection, PassdbError> {
        if !index::is_identifier(identifier) {
            return Err(PassdbError::NotFound {
                path: PathBuf::from(identifier),
            });
        }
        self.read(identifier, secret)
    }

    /// Lazily decrypt every indexed name containing `query`, case-insensitive,
    /// in name order.
    ///
    /// The matching names are fixed when this is called. The first error is
    /// yielded and ends the iteration.
    pub fn find<'a>(&'a self, query: &str, secret: &'a MasterSecret) -> Find<'a> {
        let needle = query.to_lowercase();
        let pending: Vec<_> = self
            .index
            .entries()
            .into_iter()
            .filter(|(name, _)| name.to_lowercase().contains(&needle))
            .collect();
        debug!(query = %needle, matches = pending.len(), "find");
        Find {
            store: self,
            secret,
            pending: pending.into_iter(),
            failed: false,
        }
    }

    /// Every indexed entry in name order.
    pub fn export<'a>(&'a self, secret: &'a MasterSecret) -> Find<'a> {
        self.find("", secret)
    }

    /// Append every row to the record named by its key. Returns the number of
    /// rows stored. Stops at the first failure; rows before it stay stored.
    pub fn import_rows(
        &mut self,
        rows: impl IntoIterator<Item = ImportRow>,
        secret: &MasterSecret,
    ) -> Result<usize, PassdbError> {
        let mut imported = 0;
        for row in rows {
            debug!(line = row.line, key = %row.key, "importing row");
            self.add(&row.key, secret, row.credential, false)?;
            imported += 1;
        }
        info!(imported, "import finished");
        Ok(imported)
    }

    /// Compare the index with the record files on disk.
    ///
    /// Index entries without a file are dangling. In persisted mode, record
    /// files without an index entry are orphans. Every issue is logged at
    /// warn level; nothing is repaired.
    pub fn verify(&self) -> Result<ConsistencyReport, PassdbError> {
        let on_disk = self.layout.record_ids()?;
        let entries = self.index.entries();
        let mut report = ConsistencyReport::default();

        for (name, identifier) in &entries {
            if !on_disk.contains(identifier) {
                warn!(name = %name, identifier = %identifier, "index entry has no record file");
                report.dangling.push(DanglingEntry {
                    name: name.clone(),
                    identifier: identifier.clone(),
                });
            }
        }

        if self.index.mode() == IndexMode::Persisted {
            let indexed: BTreeSet<&str> = entries.iter().map(|(_, id)| id.as_str()).collect();
            for identifier in on_disk.iter().filter(|id| !indexed.contains(id.as_str())) {
                warn!(identifier = %identifier, "record file is not in the index");
                report.orphans.push(OrphanRecord {
                    identifier: identifier.clone(),
                });
            }
        }

        info!(
            dangling = report.dangling.len(),
            orphans = report.orphans.len(),
            "verify finished"
        );
        Ok(report)
    }
}

/// Fail fast on a wrong secret when no lookup file vouched for it. Only an
/// authentication failure counts; a damaged record is left for the
/// operation that touches it.
fn check_secret_against_record(
    layout: &VaultLayout,
    codec: RecordCodec,
    secret: &MasterSecret,
) -> Result<(), PassdbError> {
    let Some(identifier) = layout.record_ids()?.into_iter().next() else {
        return Ok(());
    };
    match codec.read_record(secret, &layout.record_path(&identifier)) {
        Err(e) if e.is_invalid_master_secret() => Err(e),
        Err(e) => {
            debug!(identifier = %identifier, error = %e, "secret check skipped unreadable record");
            Ok(())
        }
        Ok(_) => Ok(()),
    }
}

/// Iterator returned by [`VaultStore::find`] and [`VaultStore::export`].
#[derive(Debug)]
pub struct Find<'a> {
    store: &'a VaultStore,
    secret: &'a MasterSecret,
    pending: std::vec::IntoIter<(String, String)>,
    failed: bool,
}

impl Iterator for Find<'_> {
    type Item = Result<(String, CredentialCollection), PassdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (name, identifier) = self.pending.next()?;
        match self.store.read(&identifier, self.secret) {
            Ok(collection) => Some(Ok((name, collection))),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(unix)]
fn create_vault_dir(dir: &Path) -> Result<(), PassdbError> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| PassdbError::io(dir, e))
}

#[cfg(not(unix))]
fn create_vault_dir(dir: &Path) -> Result<(), PassdbError> {
    std::fs::create_dir_all(dir).map_err(|e| PassdbError::io(dir, e))
}
