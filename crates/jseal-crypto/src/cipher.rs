//! AES-256-CFB encryption of a safe-data envelope
//!
//! Sealed format (binary):
//! ```text
//! [16 bytes: random IV][N bytes: CFB ciphertext of the envelope]
//! ```
//!
//! CFB carries no authentication tag of its own; integrity comes from the
//! SHA-256 checksum inside the envelope.

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use jseal_core::{CodecError, CodecResult};
use rand::RngCore;

use crate::envelope::{pack, unpack};
use crate::kdf::{derive_key, DerivedKey};
use crate::BLOCK_SIZE;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

/// Encrypt `plaintext` under an already derived key.
///
/// Returns: `[16-byte IV][ciphertext]`
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> CodecResult<Vec<u8>> {
    let envelope = pack(plaintext)?;

    let mut iv = [0u8; BLOCK_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut result = Vec::with_capacity(BLOCK_SIZE + envelope.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&envelope);

    Aes256CfbEnc::new(key.as_bytes().into(), (&iv).into()).encrypt(&mut result[BLOCK_SIZE..]);
    Ok(result)
}

/// Decrypt `[16-byte IV][ciphertext]` and return the payload.
///
/// Fails with [`CodecError::Corrupt`] when the input cannot even hold an IV,
/// and with [`CodecError::ChecksumMismatch`] for a wrong key or tampered data.
pub fn decrypt(data: &[u8], key: &DerivedKey) -> CodecResult<Vec<u8>> {
    if data.len() < BLOCK_SIZE {
        return Err(CodecError::Corrupt(format!(
            "ciphertext of {} bytes is shorter than one {BLOCK_SIZE}-byte block",
            data.len()
        )));
    }

    let (iv, ciphertext) = data.split_at(BLOCK_SIZE);
    let mut envelope = ciphertext.to_vec();
    Aes256CfbDec::new(key.as_bytes().into(), iv.into()).decrypt(&mut envelope);

    unpack(&envelope).map(<[u8]>::to_vec)
}

/// Derive a key from `passphrase` and `salt`, then [`encrypt`].
pub fn seal(plaintext: &[u8], passphrase: &[u8], salt: Option<&[u8]>) -> CodecResult<Vec<u8>> {
    encrypt(plaintext, &derive_key(passphrase, salt))
}

/// Derive a key from `passphrase` and `salt`, then [`decrypt`].
pub fn open(data: &[u8], passphrase: &[u8], salt: Option<&[u8]>) -> CodecResult<Vec<u8>> {
    decrypt(data, &derive_key(passphrase, salt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HEADER_SIZE;

    fn test_key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key(42);
        let plaintext = b"hello, encrypted world!";

        let encrypted = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = test_key(1);

        let encrypted = encrypt(b"", &key).unwrap();
        let decrypted = decrypt(&encrypted, &key).unwrap();

        assert_eq!(decrypted, b"");
    }

    #[test]
    fn test_encrypted_size() {
        let key = test_key(1);
        let encrypted = encrypt(&[0u8; 1000], &key).unwrap();

        // iv (16) + header (36) + plaintext (1000) = 1052 → envelope padded to 1040
        assert_eq!(encrypted.len(), 16 + 1040);
        assert_eq!((encrypted.len() - 16) % BLOCK_SIZE, 0);
        assert!(encrypted.len() - 16 >= HEADER_SIZE + 1000);
    }

    #[test]
    fn test_random_iv_per_call() {
        let key = test_key(3);
        let a = encrypt(b"same", &key).unwrap();
        let b = encrypt(b"same", &key).unwrap();
        assert_ne!(a[..BLOCK_SIZE], b[..BLOCK_SIZE], "IVs must differ");
        assert_ne!(a, b);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let encrypted = encrypt(b"secret data", &test_key(1)).unwrap();
        let result = decrypt(&encrypted, &test_key(2));

        assert!(matches!(result, Err(CodecError::ChecksumMismatch)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let key = test_key(9);
        let mut encrypted = encrypt(b"secret data", &key).unwrap();
        // Flip a bit inside the payload region (after IV and header)
        encrypted[BLOCK_SIZE + HEADER_SIZE] ^= 0x01;

        let result = decrypt(&encrypted, &key);
        assert!(matches!(result, Err(CodecError::ChecksumMismatch)));
    }

    #[test]
    fn test_short_input_is_corrupt() {
        let result = decrypt(&[0u8; 15], &test_key(1));
        assert!(matches!(result, Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn test_iv_only_is_corrupt() {
        // A full IV but no envelope at all
        let result = decrypt(&[0u8; 16], &test_key(1));
        assert!(matches!(result, Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn test_seal_open_with_passphrase() {
        let sealed = seal(b"payload", b"test-secret", None).unwrap();
        assert_eq!(open(&sealed, b"test-secret", None).unwrap(), b"payload");

        let err = open(&sealed, b"wrong", None).unwrap_err();
        assert!(err.is_wrong_passphrase());
    }

    #[test]
    fn test_seal_open_salt_must_match() {
        let sealed = seal(b"payload", b"pw", Some(b"salt-a")).unwrap();
        let err = open(&sealed, b"pw", Some(b"salt-b")).unwrap_err();
        assert!(err.is_wrong_passphrase());
    }

    /// `"foo bar"` sealed under `test-secret` and the default salt by an
    /// independent AES-CFB128 implementation, with IV 00..0f.
    const SEALED_FOO_BAR: [u8; 64] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
        0x0c, 0x0d, 0x0e, 0x0f, 0x75, 0x65, 0x95, 0xb0, 0xcc, 0xbd, 0x4b, 0x89,
        0xd5, 0x9f, 0x38, 0xb2, 0x72, 0x52, 0xd3, 0xac, 0x33, 0xf6, 0xc1, 0x6d,
        0x43, 0xdf, 0x03, 0x16, 0x70, 0xb0, 0xce, 0x80, 0x83, 0x6f, 0x03, 0x06,
        0x5d, 0x89, 0xd0, 0xdf, 0xbc, 0x35, 0x59, 0xab, 0x71, 0x56, 0xf4, 0x1d,
        0x94, 0x02, 0x41, 0xe5,
    ];

    #[test]
    fn test_known_answer_vector() {
        let payload = open(&SEALED_FOO_BAR, b"test-secret", None).unwrap();
        assert_eq!(payload, br#""foo bar""#);

        let err = open(&SEALED_FOO_BAR, b"test-secreT", None).unwrap_err();
        assert!(matches!(err, CodecError::ChecksumMismatch));
    }
}
