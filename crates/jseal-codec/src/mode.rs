//! Encryption modes, looked up by the tag stored in a block's `mode` key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use jseal_core::{CodecError, CodecResult};

use crate::context::CipherContext;

pub const AES_MODE: &str = "aes";
pub const PLAIN_MODE: &str = "none";

/// One pluggable way of turning payload bytes into block bytes and back.
pub trait CipherMode: Send + Sync {
    fn name(&self) -> &'static str;

    fn seal(&self, plaintext: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>>;

    fn open(&self, data: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>>;

    /// Whether this mode consults the key source.
    fn needs_key(&self) -> bool {
        true
    }
}

/// AES-256-CFB over the checksummed envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesMode;

impl CipherMode for AesMode {
    fn name(&self) -> &'static str {
        AES_MODE
    }

    fn seal(&self, plaintext: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
        let sealed = jseal_crypto::encrypt(plaintext, ctx.key()?)?;
        tracing::debug!(payload = plaintext.len(), sealed = sealed.len(), "sealed aes block");
        Ok(sealed)
    }

    fn open(&self, data: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
        let opened = jseal_crypto::decrypt(data, ctx.key()?)?;
        tracing::debug!(sealed = data.len(), payload = opened.len(), "opened aes block");
        Ok(opened)
    }
}

/// Explicitly unencrypted pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainMode;

impl CipherMode for PlainMode {
    fn name(&self) -> &'static str {
        PLAIN_MODE
    }

    fn seal(&self, plaintext: &[u8], _ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn open(&self, data: &[u8], _ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn needs_key(&self) -> bool {
        false
    }
}

/// Mode name → implementation. The default registry knows `aes` and `none`.
#[derive(Clone)]
pub struct ModeRegistry {
    modes: BTreeMap<&'static str, Arc<dyn CipherMode>>,
}

impl ModeRegistry {
    /// A registry with no modes at all.
    pub fn empty() -> Self {
        Self {
            modes: BTreeMap::new(),
        }
    }

    /// Add or replace a mode under its own name.
    pub fn register(&mut self, mode: impl CipherMode + 'static) -> &mut Self {
        self.modes.insert(mode.name(), Arc::new(mode));
        self
    }

    pub fn get(&self, name: &str) -> CodecResult<&dyn CipherMode> {
        self.modes
            .get(name)
            .map(|mode| mode.as_ref())
            .ok_or_else(|| CodecError::UnknownMode(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modes.keys().copied()
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(AesMode).register(PlainMode);
        registry
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Options;

    /// Toy mode used to exercise registration.
    struct Reverse;

    impl CipherMode for Reverse {
        fn name(&self) -> &'static str {
            "reverse"
        }

        fn seal(&self, plaintext: &[u8], _ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
            Ok(plaintext.iter().rev().copied().collect())
        }

        fn open(&self, data: &[u8], ctx: &mut CipherContext<'_>) -> CodecResult<Vec<u8>> {
            self.seal(data, ctx)
        }

        fn needs_key(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = ModeRegistry::default();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["aes", "none"]);
        assert!(registry.get("aes").unwrap().needs_key());
        assert!(!registry.get("none").unwrap().needs_key());
        assert!(matches!(
            registry.get("rot13"),
            Err(CodecError::UnknownMode(name)) if name == "rot13"
        ));
    }

    #[test]
    fn test_aes_mode_roundtrip() {
        let options = Options::new().with_passphrase("pw");
        let mut ctx = CipherContext::new(&options);
        let sealed = AesMode.seal(b"payload", &mut ctx).unwrap();
        assert_ne!(sealed, b"payload");
        assert_eq!(AesMode.open(&sealed, &mut ctx).unwrap(), b"payload");
    }

    #[test]
    fn test_aes_mode_without_key_source() {
        let options = Options::new();
        let mut ctx = CipherContext::new(&options);
        assert!(matches!(
            AesMode.seal(b"x", &mut ctx),
            Err(CodecError::NoKeySource)
        ));
    }

    #[test]
    fn test_plain_mode_is_identity() {
        let options = Options::new();
        let mut ctx = CipherContext::new(&options);
        assert_eq!(PlainMode.seal(b"abc", &mut ctx).unwrap(), b"abc");
        assert_eq!(PlainMode.open(b"abc", &mut ctx).unwrap(), b"abc");
    }

    #[test]
    fn test_register_custom_mode() {
        let mut registry = ModeRegistry::default();
        registry.register(Reverse);
        assert!(registry.contains("reverse"));

        let options = Options::new();
        let mut ctx = CipherContext::new(&options);
        let mode = registry.get("reverse").unwrap();
        assert_eq!(mode.seal(b"abc", &mut ctx).unwrap(), b"cba");
    }
}
