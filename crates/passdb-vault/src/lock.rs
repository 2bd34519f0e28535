// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisory lock that keeps a second process out of an open vault.
//!
//! The lock file lives at `<vault dir>/.passdb.lock` and is held exclusively
//! for the lifetime of [`VaultLock`]. Acquisition never blocks.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};

use passdb_core::PassdbError;
use tracing::debug;

/// Name of the lock file inside the vault directory.
pub const LOCK_FILE_NAME: &str = ".passdb.lock";

/// Exclusive hold on a vault directory. Released on drop.
#[derive(Debug)]
pub struct VaultLock {
    file: File,
    path: PathBuf,
}

impl VaultLock {
    /// Take the lock for `dir`, failing with [`PassdbError::Locked`] if
    /// another handle already holds it.
    pub fn acquire(dir: &Path) -> Result<Self, PassdbError> {
        let path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| PassdbError::io(&path, e))?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(PassdbError::Locked { path }),
            Err(TryLockError::Error(e)) => return Err(PassdbError::io(&path, e)),
        }

        debug!(path = %path.display(), "vault lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
