//! Key derivation for SM2 encryption: counter-mode SM3 expansion of the
//! shared point `x2 ‖ y2`, fused with the XOR masking step.

use core::cmp::min;

use sm3::{
    digest::{FixedOutputReset, Output, Update},
    Sm3,
};
use zeroize::Zeroize;

/// Writes `src ⊕ KDF(x2 ‖ y2, src.len())` into `dst`.
///
/// The keystream block `i` (1-based) is `SM3(x2 ‖ y2 ‖ be32(i))`. Because
/// the keystream is XORed directly into `dst`, an all-zero keystream is
/// observable as `dst == src` after the call.
///
/// `src` and `dst` must have the same length.
pub(crate) fn kdf_xor(digest: &mut Sm3, x2y2: &[u8; 64], src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());

    let mut block = Output::<Sm3>::default();
    let mut counter: u32 = 1;
    let mut offset = 0;

    while offset < src.len() {
        Update::update(digest, x2y2);
        Update::update(digest, &counter.to_be_bytes());
        FixedOutputReset::finalize_into_reset(digest, &mut block);

        let n = min(block.len(), src.len() - offset);
        for i in 0..n {
            dst[offset + i] = src[offset + i] ^ block[i];
        }
        offset += n;
        counter += 1;
    }

    block.as_mut_slice().zeroize();
}
