// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! scrypt key derivation from the master secret and a per-file nonce.
//!
//! Every record file carries its own 8-byte nonce, so each write derives a
//! different key even though the master secret never changes. The cost
//! parameters are not stored in the file; a vault must be read with the
//! parameters it was written with.

use passdb_core::PassdbError;
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretSlice};
use zeroize::Zeroizing;

/// Length of the nonce header at the start of every record file.
pub const NONCE_LEN: usize = 8;

/// Length of a derived key.
pub const KEY_LEN: usize = 32;

/// The passphrase every key is derived from. Zeroed on drop.
pub type MasterSecret = SecretSlice<u8>;

/// scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N.
    pub log_n: u8,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl KdfParams {
    /// N = 2^15, r = 8, p = 1: the parameters every vault on disk uses.
    pub const STANDARD: Self = Self {
        log_n: 15,
        r: 8,
        p: 1,
    };

    pub const fn new(log_n: u8, r: u32, p: u32) -> Self {
        Self { log_n, r, p }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Derive a 32-byte key from the master secret and a file nonce.
///
/// Deterministic for a given `(secret, nonce, params)`. The secret is only
/// borrowed; the output is wrapped in [`Zeroizing`].
pub fn derive_key(
    secret: &MasterSecret,
    nonce: &[u8; NONCE_LEN],
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, PassdbError> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| PassdbError::Crypto(format!("invalid scrypt parameters: {e}")))?;

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(secret.expose_secret(), nonce, &scrypt_params, &mut output[..])
        .map_err(|e| PassdbError::Crypto(format!("scrypt key derivation failed: {e}")))?;

    Ok(output)
}

/// Generate a fresh nonce from the system CSPRNG.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN], PassdbError> {
    let rng = SystemRandom::new();
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| PassdbError::Crypto("failed to generate random nonce".to_string()))?;
    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost for fast tests.
    const FAST: KdfParams = KdfParams::new(4, 8, 1);

    fn secret(s: &str) -> MasterSecret {
        MasterSecret::from(s.as_bytes().to_vec())
    }

    #[test]
    fn derive_key_produces_consistent_output() {
        let nonce = [7u8; NONCE_LEN];
        let key1 = derive_key(&secret("hunter2"), &nonce, FAST).unwrap();
        let key2 = derive_key(&secret("hunter2"), &nonce, FAST).unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_nonce_produces_different_key() {
        let key1 = derive_key(&secret("hunter2"), &[1u8; NONCE_LEN], FAST).unwrap();
        let key2 = derive_key(&secret("hunter2"), &[2u8; NONCE_LEN], FAST).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_secret_produces_different_key() {
        let nonce = [3u8; NONCE_LEN];
        let key1 = derive_key(&secret("one"), &nonce, FAST).unwrap();
        let key2 = derive_key(&secret("two"), &nonce, FAST).unwrap();
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn standard_params_derive_32_bytes() {
        let key = derive_key(&secret("hunter2"), &[0u8; NONCE_LEN], KdfParams::STANDARD).unwrap();
        assert_eq!(key.len(), KEY_LEN);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = derive_key(&secret("x"), &[0u8; NONCE_LEN], KdfParams::new(4, 0, 1));
        assert!(matches!(result, Err(PassdbError::Crypto(_))));
    }

    #[test]
    fn generate_nonce_produces_random_values() {
        assert_ne!(generate_nonce().unwrap(), generate_nonce().unwrap());
    }
}
