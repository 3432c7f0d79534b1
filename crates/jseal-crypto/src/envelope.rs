//! Safe-data envelope: the plaintext layout that gets encrypted
//!
//! ```text
//! [32 bytes: SHA-256(payload)][4 bytes: len(payload), LE][payload][random padding]
//! ```
//!
//! Total length is rounded up to a multiple of [`BLOCK_SIZE`]. Padding is
//! random rather than zero so it carries no information of its own.

use jseal_core::{CodecError, CodecResult};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{BLOCK_SIZE, CHECKSUM_SIZE, HEADER_SIZE};

/// Wrap `payload` into a padded, checksummed envelope.
pub fn pack(payload: &[u8]) -> CodecResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge(payload.len()))?;

    let used = HEADER_SIZE + payload.len();
    let mut envelope = Vec::with_capacity(used + padding_len(used));
    envelope.extend_from_slice(&Sha256::digest(payload));
    envelope.extend_from_slice(&len.to_le_bytes());
    envelope.extend_from_slice(payload);

    let mut padding = vec![0u8; padding_len(used)];
    rand::thread_rng().fill_bytes(&mut padding);
    envelope.extend_from_slice(&padding);

    Ok(envelope)
}

/// Validate an envelope and return the payload it carries.
///
/// A length field that points past the available bytes is reported as
/// [`CodecError::ChecksumMismatch`]: after decrypting with a wrong key the
/// length is garbage, and that case must look the same as a bad checksum.
pub fn unpack(envelope: &[u8]) -> CodecResult<&[u8]> {
    if envelope.len() < HEADER_SIZE {
        return Err(CodecError::Corrupt(format!(
            "envelope of {} bytes is shorter than its {HEADER_SIZE}-byte header",
            envelope.len()
        )));
    }

    let (checksum, rest) = envelope.split_at(CHECKSUM_SIZE);
    let (len_bytes, body) = rest.split_at(4);
    let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if len > body.len() {
        return Err(CodecError::ChecksumMismatch);
    }

    let payload = &body[..len];
    if !constant_time_eq(checksum, &Sha256::digest(payload)) {
        return Err(CodecError::ChecksumMismatch);
    }

    Ok(payload)
}

/// Bytes of padding needed to bring `len` up to a whole number of blocks.
fn padding_len(len: usize) -> usize {
    (BLOCK_SIZE - len % BLOCK_SIZE) % BLOCK_SIZE
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_layout() {
        let envelope = pack(b"hello").unwrap();

        assert_eq!(&envelope[..32], Sha256::digest(b"hello").as_slice());
        assert_eq!(&envelope[32..36], &5u32.to_le_bytes());
        assert_eq!(&envelope[36..41], b"hello");
        // 36 + 5 = 41 → 48
        assert_eq!(envelope.len(), 48);
    }

    #[test]
    fn test_pack_exact_block_has_no_padding() {
        // 36 + 12 = 48, already a multiple of 16
        let envelope = pack(&[7u8; 12]).unwrap();
        assert_eq!(envelope.len(), 48);
    }

    #[test]
    fn test_pack_empty_payload() {
        let envelope = pack(b"").unwrap();
        assert_eq!(envelope.len(), 48);
        assert_eq!(unpack(&envelope).unwrap(), b"");
    }

    #[test]
    fn test_unpack_rejects_flipped_checksum() {
        let mut envelope = pack(b"payload").unwrap();
        envelope[0] ^= 0x01;
        assert!(matches!(unpack(&envelope), Err(CodecError::ChecksumMismatch)));
    }

    #[test]
    fn test_unpack_rejects_flipped_payload() {
        let mut envelope = pack(b"payload").unwrap();
        envelope[HEADER_SIZE] ^= 0x80;
        assert!(matches!(unpack(&envelope), Err(CodecError::ChecksumMismatch)));
    }

    #[test]
    fn test_unpack_length_past_end_is_checksum_mismatch() {
        let mut envelope = pack(b"payload").unwrap();
        envelope[32..36].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(unpack(&envelope), Err(CodecError::ChecksumMismatch)));
    }

    #[test]
    fn test_unpack_short_input_is_corrupt() {
        assert!(matches!(unpack(&[0u8; 20]), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn test_padding_is_ignored() {
        let mut envelope = pack(b"abc").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;
        assert_eq!(unpack(&envelope).unwrap(), b"abc");
    }

    #[test]
    fn test_padding_len() {
        assert_eq!(padding_len(36), 12);
        assert_eq!(padding_len(48), 0);
        assert_eq!(padding_len(49), 15);
    }

    proptest! {
        #[test]
        fn prop_pack_unpack(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let envelope = pack(&payload).unwrap();
            prop_assert_eq!(envelope.len() % BLOCK_SIZE, 0);
            prop_assert!(envelope.len() >= HEADER_SIZE + payload.len());
            prop_assert_eq!(unpack(&envelope).unwrap(), payload.as_slice());
        }
    }
}
