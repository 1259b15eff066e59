#![cfg(all(feature = "alloc", feature = "getrandom"))]

use hex_literal::hex;
use proptest::prelude::*;
use rand_core::OsRng;

use sm2_pke::{
    DecryptContext, DecryptingKey, EncryptContext, Error, MAX_CIPHERTEXT_SIZE, MAX_PLAINTEXT_SIZE,
};

const PRIVATE_KEY: [u8; 32] =
    hex!("3DDD2A3679BF6F1DFC3B49D3E99114718E48EC170EB4E4D3A82052DAB19E8B50");

fn decrypting_key() -> DecryptingKey {
    DecryptingKey::from_slice(&PRIVATE_KEY).unwrap()
}

#[test]
fn chunked_encrypt_decrypts_to_whole_message() {
    let dk = decrypting_key();

    let mut ctx = EncryptContext::new(dk.encrypting_key().clone());
    ctx.update(b"encryption").unwrap();
    ctx.update(b" ").unwrap();
    let der = ctx.finish(&mut OsRng, b"standard").unwrap();

    assert_eq!(dk.decrypt_der(&der).unwrap(), b"encryption standard");
}

#[test]
fn finish_with_empty_buffer_encrypts_input_directly() {
    let dk = decrypting_key();

    let ctx = EncryptContext::new(dk.encrypting_key().clone());
    let der = ctx.finish(&mut OsRng, b"one-shot").unwrap();
    assert_eq!(dk.decrypt_der(&der).unwrap(), b"one-shot");
}

#[test]
fn finish_with_no_input_at_all_fails() {
    let dk = decrypting_key();

    let ctx = EncryptContext::new(dk.encrypting_key().clone());
    assert_eq!(ctx.finish(&mut OsRng, &[]), Err(Error::PlaintextSize));

    let ctx = DecryptContext::new(decrypting_key());
    assert_eq!(ctx.finish(&[]), Err(Error::Length));
}

#[test]
fn encrypt_context_enforces_capacity() {
    let dk = decrypting_key();

    let mut ctx = EncryptContext::new(dk.encrypting_key().clone());
    ctx.update(&[0u8; MAX_PLAINTEXT_SIZE]).unwrap();
    assert_eq!(ctx.update(&[0u8]), Err(Error::Capacity));

    // the failed append leaves the buffer usable
    let der = ctx.finish(&mut OsRng, &[]).unwrap();
    assert_eq!(dk.decrypt_der(&der).unwrap(), vec![0u8; MAX_PLAINTEXT_SIZE]);
}

#[test]
fn decrypt_context_enforces_capacity() {
    let mut ctx = DecryptContext::new(decrypting_key());
    ctx.update(&[0u8; MAX_CIPHERTEXT_SIZE]).unwrap();
    assert_eq!(ctx.update(&[0u8]), Err(Error::Capacity));
}

#[test]
fn chunked_decrypt_round_trip() {
    let dk = decrypting_key();
    let der = dk
        .encrypting_key()
        .encrypt_der(&mut OsRng, b"split ciphertext")
        .unwrap();

    let (head, tail) = der.split_at(der.len() / 2);
    let mut ctx = DecryptContext::new(decrypting_key());
    ctx.update(head).unwrap();
    assert_eq!(ctx.finish(tail).unwrap(), b"split ciphertext");
}

#[test]
fn finish_into_respects_max_output_len() {
    let dk = decrypting_key();
    let msg = [0xabu8; MAX_PLAINTEXT_SIZE];

    let mut ctx = EncryptContext::new(dk.encrypting_key().clone());
    ctx.update(&msg).unwrap();
    let mut der_buf = [0u8; EncryptContext::MAX_OUTPUT_LEN];
    let der_len = ctx.finish_into(&mut OsRng, &[], &mut der_buf).unwrap();
    assert!(der_len <= EncryptContext::MAX_OUTPUT_LEN);

    let mut ctx = DecryptContext::new(decrypting_key());
    let mut msg_buf = [0u8; DecryptContext::MAX_OUTPUT_LEN];
    let msg_len = ctx.finish_into(&der_buf[..der_len], &mut msg_buf).unwrap();
    assert_eq!(&msg_buf[..msg_len], &msg[..]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn streaming_equivalence(
        msg in proptest::collection::vec(any::<u8>(), 1..=MAX_PLAINTEXT_SIZE),
        split in any::<prop::sample::Index>(),
    ) {
        let dk = decrypting_key();
        let at = split.index(msg.len() + 1);
        let (head, tail) = msg.split_at(at.min(msg.len()));

        let mut ctx = EncryptContext::new(dk.encrypting_key().clone());
        ctx.update(head).unwrap();
        let der = ctx.finish(&mut OsRng, tail).unwrap();

        prop_assert_eq!(dk.decrypt_der(&der).unwrap(), msg);
    }
}
