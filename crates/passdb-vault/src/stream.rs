// SPDX-FileCopyrightText: 2026 Passdb Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated encrypted stream framing.
//!
//! The payload is split into segments of at most [`SEGMENT_LEN`] plaintext
//! bytes, each sealed with AES-256-GCM. On the wire a segment is
//!
//! ```text
//! [flag: u8][len: u32 BE][ciphertext || tag: len bytes]
//! ```
//!
//! where `flag` is 1 for the last segment and 0 otherwise. The GCM nonce is
//! `counter (u64 BE) || 0 0 0 || flag` and the 5 header bytes are the
//! associated data, so reordered, dropped, or appended segments and a flipped
//! final flag all fail to open.
//!
//! A [`StreamWriter`] must be closed with [`StreamWriter::finish`]; without it
//! the final segment is never written and the stream will not decode.

use std::io::{self, Read, Write};

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::kdf::KEY_LEN;

/// Maximum plaintext bytes per segment.
pub const SEGMENT_LEN: usize = 64 * 1024;

const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 5;
const FLAG_MORE: u8 = 0;
const FLAG_FINAL: u8 = 1;

/// Errors produced by the stream codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A segment failed to authenticate: wrong key or tampered data.
    #[error("authentication failed: wrong key or tampered data")]
    Authentication,

    /// The stream ended before its final segment.
    #[error("stream ended before the final segment")]
    Truncated,

    /// Framing that no writer produces.
    #[error("malformed stream: {0}")]
    Malformed(String),

    /// The key could not be used with AES-256-GCM.
    #[error("invalid stream key")]
    Key,

    /// More segments than the nonce counter can address.
    #[error("segment counter exhausted")]
    Exhausted,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

fn stream_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, CodecError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| CodecError::Key)?;
    Ok(LessSafeKey::new(unbound))
}

fn segment_nonce(counter: u64, flag: u8) -> Nonce {
    let mut bytes = [0u8; NONCE_LEN];
    bytes[..8].copy_from_slice(&counter.to_be_bytes());
    bytes[NONCE_LEN - 1] = flag;
    Nonce::assume_unique_for_key(bytes)
}

fn segment_header(flag: u8, len: usize) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[0] = flag;
    // len <= SEGMENT_LEN + TAG_LEN, always fits.
    header[1..].copy_from_slice(&(len as u32).to_be_bytes());
    header
}

/// Encrypting writer. Plaintext is buffered until a full segment is known
/// not to be the last one.
pub struct StreamWriter<W: Write> {
    inner: W,
    key: LessSafeKey,
    buf: Zeroizing<Vec<u8>>,
    counter: u64,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(key: &[u8; KEY_LEN], inner: W) -> Result<Self, CodecError> {
        Ok(Self {
            inner,
            key: stream_key(key)?,
            buf: Zeroizing::new(Vec::with_capacity(SEGMENT_LEN)),
            counter: 0,
        })
    }

    /// Seal whatever is buffered as the final segment, flush, and hand back
    /// the underlying sink.
    pub fn finish(mut self) -> Result<W, CodecError> {
        self.seal_buffered(FLAG_FINAL)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn seal_buffered(&mut self, flag: u8) -> Result<(), CodecError> {
        let mut segment = Zeroizing::new(Vec::with_capacity(self.buf.len() + TAG_LEN));
        segment.extend_from_slice(&self.buf);
        self.buf.zeroize();

        let header = segment_header(flag, segment.len() + TAG_LEN);
        self.key
            .seal_in_place_append_tag(
                segment_nonce(self.counter, flag),
                Aad::from(header),
                &mut *segment,
            )
            .map_err(|_| CodecError::Malformed("segment too large to seal".to_string()))?;

        self.inner.write_all(&header)?;
        self.inner.write_all(&segment)?;
        self.counter = self.counter.checked_add(1).ok_or(CodecError::Exhausted)?;
        Ok(())
    }
}

impl<W: Write> Write for StreamWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        if self.buf.len() == SEGMENT_LEN {
            self.seal_buffered(FLAG_MORE)?;
        }
        let take = data.len().min(SEGMENT_LEN - self.buf.len());
        self.buf.extend_from_slice(&data[..take]);
        Ok(take)
    }

    /// Flushes the sink only; buffered plaintext waits for the next segment
    /// boundary or [`StreamWriter::finish`].
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypting reader. Every byte it yields has been authenticated.
pub struct StreamReader<R: Read> {
    inner: R,
    key: LessSafeKey,
    plaintext: Zeroizing<Vec<u8>>,
    pos: usize,
    counter: u64,
    finished: bool,
}

impl<R: Read> StreamReader<R> {
    pub fn new(key: &[u8; KEY_LEN], inner: R) -> Result<Self, CodecError> {
        Ok(Self {
            inner,
            key: stream_key(key)?,
            plaintext: Zeroizing::new(Vec::with_capacity(SEGMENT_LEN)),
            pos: 0,
            counter: 0,
            finished: false,
        })
    }

    /// Decrypt the remainder of the stream into one buffer.
    pub fn into_plaintext(mut self) -> Result<Zeroizing<Vec<u8>>, CodecError> {
        let mut out = Zeroizing::new(Vec::new());
        loop {
            if self.pos < self.plaintext.len() {
                out.extend_from_slice(&self.plaintext[self.pos..]);
                self.pos = self.plaintext.len();
            }
            if self.finished {
                return Ok(out);
            }
            self.next_segment()?;
        }
    }

    fn next_segment(&mut self) -> Result<(), CodecError> {
        let mut header = [0u8; HEADER_LEN];
        read_exact_or_truncated(&mut self.inner, &mut header)?;

        let flag = header[0];
        if flag != FLAG_MORE && flag != FLAG_FINAL {
            return Err(CodecError::Malformed(format!("unknown segment flag {flag}")));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&header[1..]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if !(TAG_LEN..=SEGMENT_LEN + TAG_LEN).contains(&len) {
            return Err(CodecError::Malformed(format!("segment length {len} out of range")));
        }

        let mut segment = Zeroizing::new(vec![0u8; len]);
        read_exact_or_truncated(&mut self.inner, &mut segment)?;

        let plain = self
            .key
            .open_in_place(segment_nonce(self.counter, flag), Aad::from(header), &mut segment[..])
            .map_err(|_| CodecError::Authentication)?;
        if flag == FLAG_MORE && plain.len() != SEGMENT_LEN {
            return Err(CodecError::Malformed("short intermediate segment".to_string()));
        }

        self.plaintext.zeroize();
        self.plaintext.extend_from_slice(plain);
        self.pos = 0;
        self.counter = self.counter.checked_add(1).ok_or(CodecError::Exhausted)?;

        if flag == FLAG_FINAL {
            self.finished = true;
            let mut extra = [0u8; 1];
            if read_retrying(&mut self.inner, &mut extra)? != 0 {
                return Err(CodecError::Malformed(
                    "trailing data after final segment".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.plaintext.len() {
            if self.finished {
                return Ok(0);
            }
            self.next_segment()?;
        }
        let n = out.len().min(self.plaintext.len() - self.pos);
        out[..n].copy_from_slice(&self.plaintext[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fn read_exact_or_truncated<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), CodecError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => CodecError::Truncated,
        _ => CodecError::Io(e),
    })
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
