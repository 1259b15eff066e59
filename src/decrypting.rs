//! Support for SM2 decryption.
//!
//! ## Algorithm
//!
//! ```text
//! B1: get C1 from C and verify it satisfies the curve equation
//! B2: calculate the elliptic curve point S = [h]C1; for SM2 h = 1
//! B3: calculate [dB]C1 = (x2, y2)
//! B4: calculate t = KDF(x2 || y2, klen), error if t is all zero
//! B5: calculate M' = C2 xor t
//! B6: calculate u = Hash(x2 || M' || y2), error if u != C3
//! ```

use core::fmt::{self, Debug};

use elliptic_curve::subtle::{Choice, ConstantTimeEq};
use sm2::{FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, SecretKey};
use sm3::{digest::Digest, Sm3};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{cipher::xy_bytes, kdf::kdf_xor, Cipher, EncryptingKey, Error, Result};

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

/// SM2 secret key used for decrypting messages.
///
/// The secret scalar is zeroized on drop.
#[derive(Clone)]
pub struct DecryptingKey {
    /// Secret key.
    secret_scalar: NonZeroScalar,

    /// Encrypting key for this decrypting key.
    encrypting_key: EncryptingKey,
}

impl DecryptingKey {
    /// Create a decrypting key from a secret key.
    pub fn new(secret_key: &SecretKey) -> Self {
        Self::from_nonzero_scalar(secret_key.to_nonzero_scalar())
    }

    /// Parse a decrypting key from big endian-encoded bytes.
    pub fn from_bytes(bytes: &FieldBytes) -> Result<Self> {
        Self::from_slice(bytes)
    }

    /// Parse a decrypting key from a big endian-encoded byte slice
    /// containing a secret scalar value.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let secret_scalar = NonZeroScalar::try_from(slice).map_err(|_| Error::Length)?;
        Ok(Self::from_nonzero_scalar(secret_scalar))
    }

    /// Create a decrypting key from a non-zero scalar.
    pub fn from_nonzero_scalar(secret_scalar: NonZeroScalar) -> Self {
        let encrypting_key = EncryptingKey::new(PublicKey::from_secret_scalar(&secret_scalar));
        Self {
            secret_scalar,
            encrypting_key,
        }
    }

    /// Serialize as bytes.
    pub fn to_bytes(&self) -> FieldBytes {
        self.secret_scalar.to_bytes()
    }

    /// Borrow the secret [`NonZeroScalar`] value for this key.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn as_nonzero_scalar(&self) -> &NonZeroScalar {
        &self.secret_scalar
    }

    /// Get the [`EncryptingKey`] which corresponds to this
    /// [`DecryptingKey`].
    pub fn encrypting_key(&self) -> &EncryptingKey {
        &self.encrypting_key
    }

    /// Decrypt the [`Cipher`], allocating the plaintext.
    #[cfg(feature = "alloc")]
    pub fn decrypt(&self, cipher: &Cipher<'_>) -> Result<Vec<u8>> {
        let mut out = vec![0; cipher.c2().len()];
        self.decrypt_into(cipher, &mut out)?;
        Ok(out)
    }

    /// Decrypt the [`Cipher`] into `out`, returning the plaintext length
    /// (always the `C2` length).
    ///
    /// `out` must be at least `cipher.c2().len()` bytes; on a failed
    /// integrity check it is wiped and [`Error::HashMismatch`] returned.
    pub fn decrypt_into(&self, cipher: &Cipher<'_>, out: &mut [u8]) -> Result<usize> {
        decrypt_into(&self.secret_scalar, cipher, out)
    }

    /// Parse a DER-encoded ciphertext and decrypt it in one call.
    ///
    /// Rejects any trailing bytes after the outer SEQUENCE.
    #[cfg(feature = "alloc")]
    pub fn decrypt_der(&self, der: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(&Cipher::from_der(der)?)
    }
}

//
// Other trait impls
//

impl ConstantTimeEq for DecryptingKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.secret_scalar.ct_eq(&other.secret_scalar)
    }
}

impl Debug for DecryptingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptingKey")
            .field("encrypting_key", &self.encrypting_key)
            .finish_non_exhaustive()
    }
}

impl Drop for DecryptingKey {
    fn drop(&mut self) {
        self.secret_scalar.zeroize();
    }
}

impl ZeroizeOnDrop for DecryptingKey {}

/// Constant-time comparison
impl Eq for DecryptingKey {}
impl PartialEq for DecryptingKey {
    fn eq(&self, other: &DecryptingKey) -> bool {
        self.ct_eq(other).into()
    }
}

/// Core of the decryption transform.
fn decrypt_into(
    secret_scalar: &NonZeroScalar,
    cipher: &Cipher<'_>,
    out: &mut [u8],
) -> Result<usize> {
    let c2 = cipher.c2();
    if out.len() < c2.len() {
        return Err(Error::Length);
    }
    let out = &mut out[..c2.len()];

    // B1 is established by `Cipher`'s invariant: parsing validates curve
    // membership and encryption produces the point itself.
    // B2: S = [h]C1; the SM2 cofactor is 1, nothing to check.

    // B3: [dB]C1 = (x2, y2)
    let c1 = ProjectivePoint::from(*cipher.c1());
    let mut kp = (c1 * secret_scalar.as_ref()).to_affine();
    let x2y2 = Zeroizing::new(xy_bytes(&kp)?);
    kp.zeroize();

    // B4, B5: t = KDF(x2 || y2, klen); M' = C2 xor t
    let mut digest = Sm3::new();
    kdf_xor(&mut digest, &x2y2, c2, out);

    // an all-zero t leaves M' == C2
    if out[..] == c2[..] {
        return Err(Error::ZeroKeystream);
    }

    // B6: u = Hash(x2 || M' || y2)
    Digest::update(&mut digest, &x2y2[..32]);
    Digest::update(&mut digest, &*out);
    Digest::update(&mut digest, &x2y2[32..]);
    let u: [u8; 32] = digest.finalize_reset().into();

    if !bool::from(u[..].ct_eq(&cipher.c3()[..])) {
        out.zeroize();
        return Err(Error::HashMismatch);
    }

    Ok(out.len())
}
