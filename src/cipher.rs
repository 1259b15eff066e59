//! SM2 ciphertext records and their ASN.1 DER encoding.
//!
//! The wire format is the `SM2Cipher` SEQUENCE of GB/T 32918.4:
//!
//! ```text
//! SM2Cipher ::= SEQUENCE {
//!     XCoordinate  INTEGER,
//!     YCoordinate  INTEGER,
//!     HASH         OCTET STRING (SIZE(32)),
//!     CipherText   OCTET STRING
//! }
//! ```

use core::fmt;

use der::{
    asn1::{OctetStringRef, UintRef},
    Decode, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence, Writer,
};
use elliptic_curve::sec1::{Coordinates, FromEncodedPoint, ToEncodedPoint};
use sm2::{AffinePoint, EncodedPoint, FieldBytes};

use crate::{Error, Result, MAX_PLAINTEXT_SIZE, MIN_PLAINTEXT_SIZE};

#[cfg(feature = "alloc")]
use alloc::{borrow::Cow, vec::Vec};

/// Target DER size of the ephemeral point for
/// [`encrypt_fixlen`][crate::EncryptingKey::encrypt_fixlen].
///
/// The value is the combined length in bytes of the `XCoordinate` and
/// `YCoordinate` INTEGER encodings, tag and length octets included. A
/// coordinate whose high bit is set gains a leading zero sign octet, so
/// only three sizes can occur for a point with two full 32-byte
/// coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointSize {
    /// Neither coordinate carries a sign octet.
    Compact = 68,

    /// Exactly one coordinate carries a sign octet. This is the most
    /// likely outcome for a random point.
    Typical = 69,

    /// Both coordinates carry a sign octet.
    Max = 70,
}

/// Decoded SM2 ciphertext: the ephemeral point `C1`, the hash `C3` and
/// the masked message `C2`.
///
/// A `Cipher` is only ever constructed with a validated `C1`: parsing
/// checks curve membership, and encryption produces the point itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cipher<'a> {
    pub(crate) c1: AffinePoint,
    #[cfg(feature = "alloc")]
    pub(crate) c2: Cow<'a, [u8]>,
    #[cfg(not(feature = "alloc"))]
    pub(crate) c2: &'a [u8],
    pub(crate) c3: [u8; 32],
}

impl<'a> Cipher<'a> {
    /// Parse a ciphertext from its DER encoding.
    ///
    /// Enforces the format bounds: coordinate magnitudes of at most 32
    /// bytes (right-aligned into the 32-byte field), a 32-byte hash, a
    /// ciphertext of 1..=[`MAX_PLAINTEXT_SIZE`] bytes, no trailing data
    /// inside or after the SEQUENCE, and `C1` on the curve.
    pub fn from_der(der: &'a [u8]) -> Result<Self> {
        let raw = DerCipher::from_der(der)?;

        let x = raw.x.as_bytes();
        let y = raw.y.as_bytes();
        let hash = raw.hash.as_bytes();
        let cipher = raw.cipher.as_bytes();
        if x.len() > 32 || y.len() > 32 {
            return Err(Error::Length);
        }
        if hash.len() != 32 {
            return Err(Error::Length);
        }
        if cipher.len() < MIN_PLAINTEXT_SIZE || cipher.len() > MAX_PLAINTEXT_SIZE {
            return Err(Error::Length);
        }

        let mut x_bytes = FieldBytes::default();
        let mut y_bytes = FieldBytes::default();
        x_bytes[32 - x.len()..].copy_from_slice(x);
        y_bytes[32 - y.len()..].copy_from_slice(y);

        let point = EncodedPoint::from_affine_coordinates(&x_bytes, &y_bytes, false);
        let c1 = Option::from(AffinePoint::from_encoded_point(&point))
            .ok_or(Error::PointNotOnCurve)?;

        let mut c3 = [0u8; 32];
        c3.copy_from_slice(hash);

        Ok(Self {
            c1,
            #[cfg(feature = "alloc")]
            c2: Cow::Borrowed(cipher),
            #[cfg(not(feature = "alloc"))]
            c2: cipher,
            c3,
        })
    }

    /// Encode this ciphertext as DER.
    #[cfg(feature = "alloc")]
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let xy = xy_bytes(&self.c1)?;
        let der = DerCipher {
            x: UintRef::new(&xy[..32])?,
            y: UintRef::new(&xy[32..])?,
            hash: OctetStringRef::new(&self.c3)?,
            cipher: OctetStringRef::new(self.c2())?,
        };
        Ok(der.to_der()?)
    }

    /// Encode this ciphertext as DER into the provided buffer, returning
    /// the encoded slice.
    ///
    /// The buffer never needs more than [`MAX_CIPHERTEXT_SIZE`] bytes.
    ///
    /// [`MAX_CIPHERTEXT_SIZE`]: crate::MAX_CIPHERTEXT_SIZE
    pub fn encode_to_slice<'o>(&self, out: &'o mut [u8]) -> Result<&'o [u8]> {
        let xy = xy_bytes(&self.c1)?;
        let der = DerCipher {
            x: UintRef::new(&xy[..32])?,
            y: UintRef::new(&xy[32..])?,
            hash: OctetStringRef::new(&self.c3)?,
            cipher: OctetStringRef::new(self.c2())?,
        };
        Ok(Encode::encode_to_slice(&der, out)?)
    }

    /// Ephemeral point `C1 = [k]G`.
    pub fn c1(&self) -> &AffinePoint {
        &self.c1
    }

    /// Masked message `C2 = M ⊕ KDF(x2 ‖ y2, |M|)`. Its length equals the
    /// plaintext length.
    pub fn c2(&self) -> &[u8] {
        #[cfg(feature = "alloc")]
        return &self.c2;
        #[cfg(not(feature = "alloc"))]
        return self.c2;
    }

    /// Hash `C3 = SM3(x2 ‖ M ‖ y2)`.
    pub fn c3(&self) -> &[u8; 32] {
        &self.c3
    }
}

/// Diagnostic dump of the ciphertext fields as labelled hex.
impl fmt::Display for Cipher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xy = xy_bytes(&self.c1).map_err(|_| fmt::Error)?;
        writeln!(f, "SM2Cipher")?;
        write_hex(f, "XCoordinate", &xy[..32])?;
        write_hex(f, "YCoordinate", &xy[32..])?;
        write_hex(f, "HASH", &self.c3)?;
        write_hex(f, "CipherText", self.c2())
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, label: &str, bytes: &[u8]) -> fmt::Result {
    write!(f, "    {label}: ")?;
    for byte in bytes {
        write!(f, "{byte:02X}")?;
    }
    writeln!(f)
}

/// Borrowed form of the `SM2Cipher` SEQUENCE.
struct DerCipher<'a> {
    x: UintRef<'a>,
    y: UintRef<'a>,
    hash: OctetStringRef<'a>,
    cipher: OctetStringRef<'a>,
}

impl EncodeValue for DerCipher<'_> {
    fn value_len(&self) -> der::Result<Length> {
        let len = (self.x.encoded_len()? + self.y.encoded_len()?)?;
        let len = (len + self.hash.encoded_len()?)?;
        len + self.cipher.encoded_len()?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.x.encode(writer)?;
        self.y.encode(writer)?;
        self.hash.encode(writer)?;
        self.cipher.encode(writer)?;
        Ok(())
    }
}

impl<'a> DecodeValue<'a> for DerCipher<'a> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, _header: Header) -> der::Result<Self> {
        Ok(Self {
            x: UintRef::decode(reader)?,
            y: UintRef::decode(reader)?,
            hash: OctetStringRef::decode(reader)?,
            cipher: OctetStringRef::decode(reader)?,
        })
    }
}

impl<'a> Sequence<'a> for DerCipher<'a> {}

/// Serialize an affine point as its raw 64-byte `x ‖ y` coordinates.
///
/// Fails only for the point at infinity, which has no uncompressed
/// encoding and cannot occur in a valid ciphertext.
pub(crate) fn xy_bytes(point: &AffinePoint) -> Result<[u8; 64]> {
    match point.to_encoded_point(false).coordinates() {
        Coordinates::Uncompressed { x, y } => {
            let mut bytes = [0u8; 64];
            bytes[..32].copy_from_slice(x);
            bytes[32..].copy_from_slice(y);
            Ok(bytes)
        }
        _ => Err(Error::PointNotOnCurve),
    }
}

/// Combined DER length of the two coordinate INTEGERs of `point`,
/// computed without emitting anything.
pub(crate) fn der_point_len(point: &AffinePoint) -> Result<usize> {
    let xy = xy_bytes(point)?;
    let len = (UintRef::new(&xy[..32])?.encoded_len()? + UintRef::new(&xy[32..])?.encoded_len()?)?;
    Ok(usize::try_from(len)?)
}
