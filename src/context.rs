//! Buffered SM2 encryption and decryption contexts.
//!
//! SM2 encryption is a one-shot transform, not an incremental mode, so
//! these contexts are bounded accumulators: [`update`][EncryptContext::update]
//! collects input chunks and `finish` runs the one-shot transform over
//! everything collected. The accumulated total is subject to the same
//! bounds as the one-shot API.
//!
//! `finish` consumes the context, so a context cannot be reused; create a
//! new one for the next message. Buffers are wiped when the context is
//! dropped.

use core::fmt::{self, Debug};

use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    Cipher, DecryptingKey, EncryptingKey, Error, Result, MAX_CIPHERTEXT_SIZE, MAX_PLAINTEXT_SIZE,
};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Buffered encryption context: accumulates plaintext chunks, then
/// encrypts them as a single message.
pub struct EncryptContext {
    key: EncryptingKey,
    buf: [u8; MAX_PLAINTEXT_SIZE],
    buf_size: usize,
}

impl EncryptContext {
    /// Largest possible output of [`finish_into`][Self::finish_into];
    /// size the output buffer from this constant.
    pub const MAX_OUTPUT_LEN: usize = MAX_CIPHERTEXT_SIZE;

    /// Create a context encrypting to `key` with an empty buffer.
    pub fn new(key: EncryptingKey) -> Self {
        Self {
            key,
            buf: [0u8; MAX_PLAINTEXT_SIZE],
            buf_size: 0,
        }
    }

    /// Append plaintext to the context.
    ///
    /// Fails with [`Error::Capacity`] if the accumulated plaintext would
    /// exceed [`MAX_PLAINTEXT_SIZE`].
    pub fn update(&mut self, input: &[u8]) -> Result<()> {
        if input.len() > MAX_PLAINTEXT_SIZE - self.buf_size {
            return Err(Error::Capacity);
        }
        self.buf[self.buf_size..self.buf_size + input.len()].copy_from_slice(input);
        self.buf_size += input.len();
        Ok(())
    }

    /// Append the trailing `input` and encrypt the accumulated plaintext,
    /// returning the DER-encoded ciphertext.
    ///
    /// If nothing was accumulated, `input` is encrypted directly.
    #[cfg(feature = "alloc")]
    pub fn finish<R: CryptoRngCore>(mut self, rng: &mut R, input: &[u8]) -> Result<Vec<u8>> {
        if self.buf_size == 0 {
            return self.key.encrypt_der(rng, input);
        }
        self.update(input)?;
        self.key.encrypt_der(rng, &self.buf[..self.buf_size])
    }

    /// Like [`finish`][Self::finish], writing the DER-encoded ciphertext
    /// into `out` and returning its length.
    pub fn finish_into<R: CryptoRngCore>(
        mut self,
        rng: &mut R,
        input: &[u8],
        out: &mut [u8],
    ) -> Result<usize> {
        let mut c2_buf = [0u8; MAX_PLAINTEXT_SIZE];
        let cipher = if self.buf_size == 0 {
            self.key.encrypt_buf(rng, input, &mut c2_buf)?
        } else {
            self.update(input)?;
            self.key.encrypt_buf(rng, &self.buf[..self.buf_size], &mut c2_buf)?
        };
        Ok(cipher.encode_to_slice(out)?.len())
    }
}

impl Debug for EncryptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptContext")
            .field("key", &self.key)
            .field("buf_size", &self.buf_size)
            .finish_non_exhaustive()
    }
}

impl Drop for EncryptContext {
    fn drop(&mut self) {
        self.buf.zeroize();
        self.buf_size = 0;
    }
}

impl ZeroizeOnDrop for EncryptContext {}

/// Buffered decryption context: accumulates DER ciphertext chunks, then
/// decrypts them as a single ciphertext.
pub struct DecryptContext {
    key: DecryptingKey,
    buf: [u8; MAX_CIPHERTEXT_SIZE],
    buf_size: usize,
}

impl DecryptContext {
    /// Largest possible output of [`finish_into`][Self::finish_into];
    /// size the output buffer from this constant.
    pub const MAX_OUTPUT_LEN: usize = MAX_PLAINTEXT_SIZE;

    /// Create a context decrypting with `key`, with an empty buffer.
    pub fn new(key: DecryptingKey) -> Self {
        Self {
            key,
            buf: [0u8; MAX_CIPHERTEXT_SIZE],
            buf_size: 0,
        }
    }

    /// Append ciphertext to the context.
    ///
    /// Fails with [`Error::Capacity`] if the accumulated ciphertext would
    /// exceed [`MAX_CIPHERTEXT_SIZE`].
    pub fn update(&mut self, input: &[u8]) -> Result<()> {
        if input.len() > MAX_CIPHERTEXT_SIZE - self.buf_size {
            return Err(Error::Capacity);
        }
        self.buf[self.buf_size..self.buf_size + input.len()].copy_from_slice(input);
        self.buf_size += input.len();
        Ok(())
    }

    /// Append the trailing `input` and decrypt the accumulated
    /// DER-encoded ciphertext, returning the plaintext.
    ///
    /// If nothing was accumulated, `input` is decrypted directly.
    #[cfg(feature = "alloc")]
    pub fn finish(mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.buf_size == 0 {
            if input.is_empty() || input.len() > MAX_CIPHERTEXT_SIZE {
                return Err(Error::Length);
            }
            return self.key.decrypt_der(input);
        }
        self.update(input)?;
        self.key.decrypt_der(&self.buf[..self.buf_size])
    }

    /// Like [`finish`][Self::finish], writing the plaintext into `out`
    /// and returning its length.
    pub fn finish_into(mut self, input: &[u8], out: &mut [u8]) -> Result<usize> {
        let der = if self.buf_size == 0 {
            if input.is_empty() || input.len() > MAX_CIPHERTEXT_SIZE {
                return Err(Error::Length);
            }
            input
        } else {
            self.update(input)?;
            &self.buf[..self.buf_size]
        };
        let cipher = Cipher::from_der(der)?;
        self.key.decrypt_into(&cipher, out)
    }
}

impl Debug for DecryptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptContext")
            .field("key", &self.key)
            .field("buf_size", &self.buf_size)
            .finish_non_exhaustive()
    }
}

impl Drop for DecryptContext {
    fn drop(&mut self) {
        self.buf.zeroize();
        self.buf_size = 0;
    }
}

impl ZeroizeOnDrop for DecryptContext {}
