//! The in-tree crypto block: `{"mode": "aes", "data": "<base64url>"}`
//!
//! `data` is unpadded base64url of the sealed bytes. For `aes` those bytes are
//! `IV || CFB(envelope)`; for `none` they are the payload itself.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jseal_core::{CodecError, CodecResult};

use crate::context::CipherContext;
use crate::mode::ModeRegistry;
use crate::value::{describe, Map, Value};

const MODE_KEY: &str = "mode";
const DATA_KEY: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptBlock {
    pub mode: String,
    pub data: Vec<u8>,
}

impl CryptBlock {
    pub fn new(mode: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mode: mode.into(),
            data,
        }
    }

    /// Seal `plaintext` with the named mode from the context's registry.
    pub fn seal(mode: &str, plaintext: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Self> {
        let cipher = ctx.options().modes.get(mode)?;
        let data = cipher.seal(plaintext, ctx)?;
        Ok(Self::new(mode, data))
    }

    /// Parse a tree node as a block.
    ///
    /// Keys other than `mode` and `data` are ignored.
    pub fn parse(src: &Value) -> CodecResult<Self> {
        let object = src
            .as_object()
            .ok_or_else(|| CodecError::Malformed(format!("expected object, found {}", describe(src))))?;

        let mode = string_key(object, MODE_KEY)?;
        let encoded = string_key(object, DATA_KEY)?;
        let data = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CodecError::Malformed(format!("invalid base64 in {DATA_KEY:?}: {e}")))?;

        Ok(Self::new(mode, data))
    }

    /// Parse `src` as a block only if its mode is registered.
    ///
    /// Ordinary objects that happen to carry string `mode` and `data` keys
    /// are not blocks.
    pub fn recognize(src: &Value, modes: &ModeRegistry) -> Option<Self> {
        Self::parse(src).ok().filter(|block| modes.contains(&block.mode))
    }

    pub fn is_block(src: &Value, modes: &ModeRegistry) -> bool {
        Self::recognize(src, modes).is_some()
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(MODE_KEY.into(), Value::String(self.mode.clone()));
        object.insert(DATA_KEY.into(), Value::String(URL_SAFE_NO_PAD.encode(&self.data)));
        Value::Object(object)
    }

    /// The payload bytes, decrypted by whichever mode the block names.
    pub fn raw_data(&self, ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
        let cipher = ctx.options().modes.get(&self.mode)?;
        cipher.open(&self.data, ctx)
    }
}

fn string_key<'v>(object: &'v Map<String, Value>, key: &str) -> CodecResult<&'v str> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(CodecError::Malformed(format!(
            "{key:?} must be a string, found {}",
            describe(other)
        ))),
        None => Err(CodecError::Malformed(format!("missing {key:?}"))),
    }
}
