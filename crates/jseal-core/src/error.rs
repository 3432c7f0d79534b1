use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Every failure an encode or decode call can surface.
///
/// A failure anywhere in the tree aborts the whole call; no partially
/// decoded value is ever handed back.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value's shape is not representable (mappings, or anything that is
    /// not a pointer, record, sequence or scalar).
    #[error("unsupported data shape: {0}")]
    UnsupportedShape(String),

    /// The tree does not have the structure of an encrypted block.
    #[error("malformed encrypted block: {0}")]
    Malformed(String),

    #[error("unknown encryption mode {0:?}")]
    UnknownMode(String),

    /// Wrong passphrase or corrupted ciphertext. A length field pointing past
    /// the decrypted bytes lands here too.
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// Ciphertext too short to hold an IV and an envelope header.
    #[error("data block corrupt: {0}")]
    Corrupt(String),

    #[error("cannot assign {found} to {expected}")]
    Assignment { expected: &'static str, found: String },

    #[error("no key source defined")]
    NoKeySource,

    #[error("key source failed: {0}")]
    KeySource(anyhow::Error),

    /// The text could not be parsed as a tree at all.
    #[error("malformed document: {0}")]
    Syntax(String),

    #[error("no value at {0:?}")]
    MissingPath(String),

    #[error("payload of {0} bytes does not fit the envelope length field")]
    PayloadTooLarge(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn is_wrong_passphrase(&self) -> bool {
        matches!(self, CodecError::ChecksumMismatch)
    }

    pub fn assignment(expected: &'static str, found: impl Into<String>) -> Self {
        CodecError::Assignment {
            expected,
            found: found.into(),
        }
    }
}

/// True exactly when `err` means "wrong passphrase or corrupted ciphertext".
pub fn is_wrong_passphrase(err: &CodecError) -> bool {
    err.is_wrong_passphrase()
}
