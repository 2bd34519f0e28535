// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted credential store for passdb.
//!
//! Each name's credentials live in their own record file: an 8-byte nonce
//! followed by an AES-256-GCM segmented stream keyed by
//! scrypt(master secret, nonce). A lookup index maps names to the SHA-256
//! identifiers the record files are named after.

pub mod generate;
pub mod import;
pub mod index;
pub mod kdf;
pub mod lock;
pub mod prompt;
pub mod record;
pub mod store;
pub mod stream;

pub use generate::generate_password;
pub use import::{ImportRow, read_rows, read_rows_from_path};
pub use index::{LookupIndex, identifier_for};
pub use kdf::{KdfParams, MasterSecret};
pub use prompt::{prompt_line, prompt_secret};
pub use record::RecordCodec;
pub use store::{ConsistencyReport, DanglingEntry, Find, OrphanRecord, StoreOptions, VaultStore};
