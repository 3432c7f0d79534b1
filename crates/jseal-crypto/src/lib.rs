//! jseal-crypto: the byte-level half of the codec
//!
//! Sealed byte layout:
//! ```text
//! IV (16 bytes) || AES-256-CFB( checksum (32) || length (4, LE) || payload || random padding )
//! ```
//!
//! The key is PBKDF2-HMAC-SHA256 (4096 rounds) over the passphrase and a salt.
//! The padding rounds the envelope up to a whole number of AES blocks.

pub mod cipher;
pub mod envelope;
pub mod kdf;

pub use cipher::{decrypt, encrypt, open, seal};
pub use envelope::{pack, unpack};
pub use kdf::{derive_key, DerivedKey, DEFAULT_SALT};

/// Size of a derived key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// AES block size; also the IV length
pub const BLOCK_SIZE: usize = 16;

/// SHA-256 checksum length at the start of the envelope
pub const CHECKSUM_SIZE: usize = 32;

/// Checksum plus the 4-byte little-endian payload length
pub const HEADER_SIZE: usize = CHECKSUM_SIZE + 4;
