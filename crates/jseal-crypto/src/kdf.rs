//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → AES-256 key

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// PBKDF2 iteration count. Changing it breaks every existing document.
pub const ITERATIONS: u32 = 4096;

/// Salt used when the caller supplies none.
///
/// This is a compiled-in constant, so keys derived with it are only as
/// strong as the passphrase: anyone with the source can precompute them.
/// It is kept for compatibility with documents sealed without an explicit
/// salt. Supply your own salt wherever that matters.
pub const DEFAULT_SALT: [u8; 64] = [
    217, 120, 102, 168, 130, 157, 67, 162, 186, 241, 221, 193, 33, 160, 154, 231, 211, 220, 105,
    8, 21, 169, 106, 229, 251, 47, 91, 152, 132, 77, 0, 128, 235, 190, 143, 171, 175, 22, 219, 38,
    58, 90, 61, 246, 183, 194, 54, 151, 223, 236, 72, 12, 30, 7, 94, 200, 229, 173, 235, 104, 128,
    123, 157, 113,
];

/// A 256-bit key derived from a passphrase.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a passphrase and optional salt.
///
/// Pure and deterministic. An empty passphrase is valid input. `None` for the
/// salt selects [`DEFAULT_SALT`].
pub fn derive_key(passphrase: &[u8], salt: Option<&[u8]>) -> DerivedKey {
    let salt = match salt {
        Some(salt) => salt,
        None => {
            tracing::debug!("deriving key with the compiled-in default salt");
            &DEFAULT_SALT[..]
        }
    };

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passphrase, salt, ITERATIONS, &mut key);
    DerivedKey::from_bytes(key)
}
