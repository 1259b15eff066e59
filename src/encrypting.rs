//! Support for SM2 encryption.
//!
//! ## Algorithm
//!
//! ```text
//! A1: pick a random number k in [1, n-1] via a random number generator
//! A2: calculate the elliptic curve point C1 = [k]G = (x1, y1)
//! A3: calculate the elliptic curve point S = [h]PB; for SM2 h = 1
//! A4: calculate the elliptic curve point [k]PB = (x2, y2)
//! A5: calculate t = KDF(x2 || y2, klen), return to A1 if t is all zero
//! A6: calculate C2 = M xor t
//! A7: calculate C3 = Hash(x2 || M || y2)
//! ```

use elliptic_curve::{ops::MulByGenerator, PrimeField};
use rand_core::CryptoRngCore;
use sm2::{AffinePoint, NonZeroScalar, ProjectivePoint, PublicKey, Scalar};
use sm3::{digest::Digest, Sm3};
use zeroize::{Zeroize, Zeroizing};

use crate::{
    cipher::{der_point_len, xy_bytes},
    kdf::kdf_xor,
    Cipher, Error, PointSize, Result, MAX_PLAINTEXT_SIZE, MIN_PLAINTEXT_SIZE,
};

#[cfg(feature = "alloc")]
use alloc::{borrow::Cow, boxed::Box, vec, vec::Vec};

/// Retry budget for hitting the requested DER point size.
const FIXLEN_TRIES: u32 = 200;

/// SM2 public key used for encrypting messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptingKey {
    public_key: PublicKey,
}

impl EncryptingKey {
    /// Create an encrypting key from a public key.
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Create an encrypting key from an affine point.
    ///
    /// Returns an error if the point is the identity.
    pub fn from_affine(affine: AffinePoint) -> Result<Self> {
        PublicKey::from_affine(affine)
            .map(Self::new)
            .map_err(|_| Error::PointNotOnCurve)
    }

    /// Parse an encrypting key from a SEC1-encoded point.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        PublicKey::from_sec1_bytes(bytes)
            .map(Self::new)
            .map_err(|_| Error::PointNotOnCurve)
    }

    /// Borrow the inner [`PublicKey`].
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Borrow the inner [`AffinePoint`].
    pub fn as_affine(&self) -> &AffinePoint {
        self.public_key.as_affine()
    }

    /// Serialize this key as an uncompressed SEC1-encoded point.
    #[cfg(feature = "alloc")]
    pub fn to_sec1_bytes(&self) -> Box<[u8]> {
        self.public_key.to_sec1_bytes()
    }

    /// Encrypt `msg` into a [`Cipher`].
    ///
    /// `msg` must be [`MIN_PLAINTEXT_SIZE`]..=[`MAX_PLAINTEXT_SIZE`]
    /// bytes long.
    #[cfg(feature = "alloc")]
    pub fn encrypt<R: CryptoRngCore>(&self, rng: &mut R, msg: &[u8]) -> Result<Cipher<'static>> {
        self.encrypt_inner(rng, msg, None)
    }

    /// Encrypt `msg` into a [`Cipher`] whose ephemeral point encodes to
    /// exactly `point_size` DER bytes.
    ///
    /// The ephemeral scalar is redrawn until the coordinate INTEGERs of
    /// `C1` hit the requested size, trading a bounded number of redraws
    /// for a predictable wire footprint. Fails with
    /// [`Error::RetriesExhausted`] if 200 redraws were not enough.
    #[cfg(feature = "alloc")]
    pub fn encrypt_fixlen<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        msg: &[u8],
        point_size: PointSize,
    ) -> Result<Cipher<'static>> {
        self.encrypt_inner(rng, msg, Some(point_size))
    }

    /// Encrypt `msg` into a [`Cipher`] borrowing `c2_buf` as the `C2`
    /// storage.
    ///
    /// `c2_buf` must be at least `msg.len()` bytes.
    pub fn encrypt_buf<'a, R: CryptoRngCore>(
        &self,
        rng: &mut R,
        msg: &[u8],
        c2_buf: &'a mut [u8],
    ) -> Result<Cipher<'a>> {
        let mut c1 = AffinePoint::IDENTITY;
        let mut c3 = [0u8; 32];
        let len = encrypt_into(&self.public_key, rng, msg, None, &mut c1, c2_buf, &mut c3)?;
        let c2 = &c2_buf[..len];

        #[cfg(feature = "alloc")]
        let c2 = Cow::Borrowed(c2);

        Ok(Cipher { c1, c2, c3 })
    }

    /// Encrypt `msg` and serialize the result as DER in one call.
    #[cfg(feature = "alloc")]
    pub fn encrypt_der<R: CryptoRngCore>(&self, rng: &mut R, msg: &[u8]) -> Result<Vec<u8>> {
        self.encrypt(rng, msg)?.to_der()
    }

    /// [`encrypt_fixlen`][Self::encrypt_fixlen] followed by DER
    /// serialization.
    #[cfg(feature = "alloc")]
    pub fn encrypt_der_fixlen<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        msg: &[u8],
        point_size: PointSize,
    ) -> Result<Vec<u8>> {
        self.encrypt_fixlen(rng, msg, point_size)?.to_der()
    }

    #[cfg(feature = "alloc")]
    fn encrypt_inner<R: CryptoRngCore>(
        &self,
        rng: &mut R,
        msg: &[u8],
        point_size: Option<PointSize>,
    ) -> Result<Cipher<'static>> {
        let mut c1 = AffinePoint::IDENTITY;
        let mut c2 = vec![0; msg.len()];
        let mut c3 = [0u8; 32];
        encrypt_into(&self.public_key, rng, msg, point_size, &mut c1, &mut c2, &mut c3)?;
        Ok(Cipher {
            c1,
            c2: Cow::Owned(c2),
            c3,
        })
    }
}

impl From<PublicKey> for EncryptingKey {
    fn from(public_key: PublicKey) -> EncryptingKey {
        EncryptingKey::new(public_key)
    }
}

impl AsRef<AffinePoint> for EncryptingKey {
    fn as_ref(&self) -> &AffinePoint {
        self.as_affine()
    }
}

/// Core of the encryption transform: writes the three ciphertext
/// components into caller-provided buffers and returns the `C2` length.
fn encrypt_into<R: CryptoRngCore>(
    public_key: &PublicKey,
    rng: &mut R,
    msg: &[u8],
    point_size: Option<PointSize>,
    c1_out: &mut AffinePoint,
    c2_out: &mut [u8],
    c3_out: &mut [u8; 32],
) -> Result<usize> {
    if msg.len() < MIN_PLAINTEXT_SIZE || msg.len() > MAX_PLAINTEXT_SIZE {
        return Err(Error::PlaintextSize);
    }
    if c2_out.len() < msg.len() {
        return Err(Error::Length);
    }
    let c2_out = &mut c2_out[..msg.len()];

    // A3: S = [h]PB. The SM2 cofactor is 1, so S = PB, and `PublicKey`
    // already excludes the identity.
    let pb = ProjectivePoint::from(*public_key.as_affine());

    let mut digest = Sm3::new();
    let mut tries = FIXLEN_TRIES;
    loop {
        // A1: rand k in [1, n-1]
        let k = Zeroizing::new(next_k(rng)?);
        let k_scalar: &Scalar = (*k).as_ref();

        // A2: C1 = [k]G = (x1, y1)
        let kg = ProjectivePoint::mul_by_generator(k_scalar).to_affine();

        if let Some(size) = point_size {
            if der_point_len(&kg)? != size as usize {
                if tries == 0 {
                    return Err(Error::RetriesExhausted);
                }
                tries -= 1;
                continue;
            }
        }

        // A4: [k]PB = (x2, y2)
        let mut kp = (pb * k_scalar).to_affine();
        let x2y2 = Zeroizing::new(xy_bytes(&kp)?);
        kp.zeroize();

        // A5, A6: t = KDF(x2 || y2, klen); C2 = M xor t
        kdf_xor(&mut digest, &x2y2, msg, c2_out);

        // an all-zero t leaves C2 == M; redraw k
        if c2_out[..] == msg[..] {
            continue;
        }

        *c1_out = kg;

        // A7: C3 = Hash(x2 || M || y2)
        Digest::update(&mut digest, &x2y2[..32]);
        Digest::update(&mut digest, msg);
        Digest::update(&mut digest, &x2y2[32..]);
        *c3_out = digest.finalize_reset().into();

        return Ok(msg.len());
    }
}

/// Rejection-sample an ephemeral scalar uniform in `[1, n-1]`.
fn next_k<R: CryptoRngCore>(rng: &mut R) -> Result<NonZeroScalar> {
    loop {
        let mut bytes = [0u8; 32];
        rng.try_fill_bytes(&mut bytes).map_err(|_| Error::Rng)?;
        let scalar = Option::<Scalar>::from(Scalar::from_repr(bytes.into()));
        bytes.zeroize();

        if let Some(scalar) = scalar {
            if let Some(k) = Option::<NonZeroScalar>::from(NonZeroScalar::new(scalar)) {
                return Ok(k);
            }
        }
    }
}
