// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record file codec.
//!
//! A record file is an 8-byte nonce followed by an authenticated stream
//! (see [`crate::stream`]) wrapping a JSON payload. The key for the stream is
//! derived from the master secret and that nonce, and a fresh nonce is drawn
//! on every write.
//!
//! Writes go to a temporary file in the destination directory which is
//! renamed over the destination only after the stream is finished, flushed
//! and synced. A failed write leaves the previous file untouched.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use passdb_core::{CredentialCollection, PassdbError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::kdf::{self, KdfParams, MasterSecret, NONCE_LEN};
use crate::stream::{CodecError, StreamReader, StreamWriter};

/// Reads and writes record files with a fixed set of KDF parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCodec {
    params: KdfParams,
}

impl RecordCodec {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Decrypt a credential collection.
    pub fn read_record(
        &self,
        secret: &MasterSecret,
        path: &Path,
    ) -> Result<CredentialCollection, PassdbError> {
        self.read_payload(secret, path)
    }

    /// Encrypt a credential collection under a fresh nonce.
    pub fn write_record(
        &self,
        secret: &MasterSecret,
        path: &Path,
        collection: &CredentialCollection,
    ) -> Result<(), PassdbError> {
        self.write_payload(secret, path, collection)
    }

    /// Decrypt and decode any JSON payload stored in record format.
    ///
    /// Authentication failures become [`PassdbError::InvalidMasterSecret`];
    /// a short nonce, broken framing or non-conforming JSON become
    /// [`PassdbError::Format`].
    pub fn read_payload<T: DeserializeOwned>(
        &self,
        secret: &MasterSecret,
        path: &Path,
    ) -> Result<T, PassdbError> {
        let file = File::open(path).map_err(|e| PassdbError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let mut nonce = [0u8; NONCE_LEN];
        reader.read_exact(&mut nonce).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => PassdbError::format(path, "truncated nonce"),
            _ => PassdbError::io(path, e),
        })?;

        let key = kdf::derive_key(secret, &nonce, self.params)?;
        let plaintext = StreamReader::new(&key, reader)
            .and_then(StreamReader::into_plaintext)
            .map_err(|e| map_codec_err(path, e))?;

        debug!(path = %path.display(), bytes = plaintext.len(), "record decrypted");
        serde_json::from_slice(&plaintext)
            .map_err(|e| PassdbError::format(path, format!("invalid payload: {e}")))
    }

    /// Encode and encrypt any serializable payload in record format.
    pub fn write_payload<T: Serialize + ?Sized>(
        &self,
        secret: &MasterSecret,
        path: &Path,
        payload: &T,
    ) -> Result<(), PassdbError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let nonce = kdf::generate_nonce()?;
        let key = kdf::derive_key(secret, &nonce, self.params)?;

        let tmp = tempfile::Builder::new()
            .prefix(".passdb-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| PassdbError::io(dir, e))?;
        let tmp_path = tmp.path().to_path_buf();

        {
            let mut out = BufWriter::new(tmp.as_file());
            out.write_all(&nonce)
                .map_err(|e| PassdbError::io(&tmp_path, e))?;

            let mut stream =
                StreamWriter::new(&key, out).map_err(|e| map_codec_err(&tmp_path, e))?;
            serde_json::to_writer(&mut stream, payload)
                .map_err(|e| PassdbError::io(&tmp_path, e.into()))?;
            // finish() seals the final segment and flushes the BufWriter.
            stream.finish().map_err(|e| map_codec_err(&tmp_path, e))?;
        }

        tmp.as_file()
            .sync_all()
            .map_err(|e| PassdbError::io(&tmp_path, e))?;
        tmp.persist(path)
            .map_err(|e| PassdbError::io(path, e.error))?;
        sync_directory(dir)?;

        debug!(path = %path.display(), "record written");
        Ok(())
    }
}

fn map_codec_err(path: &Path, err: CodecError) -> PassdbError {
    match err {
        CodecError::Authentication => PassdbError::InvalidMasterSecret {
            path: path.to_path_buf(),
        },
        CodecError::Key => PassdbError::Crypto("derived key rejected by AES-256-GCM".to_string()),
        CodecError::Io(e) => PassdbError::io(path, e),
        other @ (CodecError::Truncated | CodecError::Malformed(_) | CodecError::Exhausted) => {
            PassdbError::format(path, other.to_string())
        }
    }
}

/// Make the rename durable.
#[cfg(unix)]
fn sync_directory(dir: &Path) -> Result<(), PassdbError> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| PassdbError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> Result<(), PassdbError> {
    Ok(())
}
