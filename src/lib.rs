#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::implicit_saturating_sub,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Usage
//!
//! NOTE: requires the `alloc` and `getrandom` crate features (both enabled
//! by default).
//!
#![cfg_attr(feature = "std", doc = "```")]
#![cfg_attr(not(feature = "std"), doc = "```ignore")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use rand_core::OsRng; // requires 'getrandom' feature
//! use sm2_pke::{DecryptingKey, SecretKey};
//!
//! // Encrypting
//! let secret_key = SecretKey::random(&mut OsRng); // serialize with `::to_bytes()`
//! let decrypting_key = DecryptingKey::new(&secret_key);
//! let encrypting_key = decrypting_key.encrypting_key();
//! let message = b"plaintext";
//! let ciphertext = encrypting_key.encrypt_der(&mut OsRng, message)?;
//!
//! // Decrypting
//! let plaintext = decrypting_key.decrypt_der(&ciphertext)?;
//! assert_eq!(plaintext, message);
//! # Ok(())
//! # }
//! ```
//!
//! Ciphertexts can also be held as [`Cipher`] records to inspect the
//! `(C1, C3, C2)` components before serializing, and produced with a
//! pinned DER point size via [`EncryptingKey::encrypt_fixlen`]. Callers
//! that receive their input in chunks can use [`EncryptContext`] and
//! [`DecryptContext`].

#[cfg(feature = "alloc")]
#[allow(unused_extern_crates)]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod cipher;
mod context;
mod decrypting;
mod encrypting;
mod error;
mod kdf;

pub use crate::{
    cipher::{Cipher, PointSize},
    context::{DecryptContext, EncryptContext},
    decrypting::DecryptingKey,
    encrypting::EncryptingKey,
    error::{Error, Result},
};

pub use der;
pub use elliptic_curve;
pub use sm2::{
    AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, Scalar,
    SecretKey, Sm2,
};

/// Smallest plaintext accepted by the encryption transform, in bytes.
pub const MIN_PLAINTEXT_SIZE: usize = 1;

/// Largest plaintext accepted by the encryption transform, in bytes.
///
/// Also bounds the `CipherText` OCTET STRING the DER parser will accept.
pub const MAX_PLAINTEXT_SIZE: usize = 255;

/// Largest possible DER-encoded ciphertext, in bytes.
///
/// Worst case `SM2Cipher`: two 35-byte coordinate INTEGERs, a 34-byte
/// hash OCTET STRING, a 258-byte ciphertext OCTET STRING and a 4-byte
/// SEQUENCE header.
pub const MAX_CIPHERTEXT_SIZE: usize = 366;
