//! Call options, key sources, and the per-call cipher context.

use std::fmt;
use std::sync::Arc;

use jseal_core::{CodecError, CodecResult, Format};
use jseal_crypto::{derive_key, DerivedKey};
use zeroize::Zeroizing;

use crate::mode::ModeRegistry;

/// Supplies the passphrase the first time an encrypted field needs a key.
///
/// The same source may be shared by concurrent calls, hence `Send + Sync`.
pub trait KeySource: Send + Sync {
    fn passphrase(&self) -> anyhow::Result<Zeroizing<Vec<u8>>>;
}

impl<F> KeySource for F
where
    F: Fn() -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    fn passphrase(&self) -> anyhow::Result<Zeroizing<Vec<u8>>> {
        self().map(Zeroizing::new)
    }
}

/// A fixed passphrase held in memory.
pub struct StaticKey(Zeroizing<Vec<u8>>);

impl StaticKey {
    pub fn new(passphrase: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(passphrase.into()))
    }
}

impl KeySource for StaticKey {
    fn passphrase(&self) -> anyhow::Result<Zeroizing<Vec<u8>>> {
        Ok(self.0.clone())
    }
}

impl fmt::Debug for StaticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticKey([REDACTED])")
    }
}

/// Reads the passphrase from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvKey {
    var: String,
}

impl EnvKey {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl KeySource for EnvKey {
    fn passphrase(&self) -> anyhow::Result<Zeroizing<Vec<u8>>> {
        let value = std::env::var(&self.var)
            .map_err(|e| anyhow::anyhow!("reading passphrase from ${}: {e}", self.var))?;
        Ok(Zeroizing::new(value.into_bytes()))
    }
}

/// Settings for one encode or decode call.
#[derive(Clone, Default)]
pub struct Options {
    /// KDF salt; `None` falls back to the compiled-in default salt
    pub salt: Option<Vec<u8>>,
    pub key_source: Option<Arc<dyn KeySource>>,
    pub format: Format,
    pub modes: ModeRegistry,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_key_source(mut self, source: impl KeySource + 'static) -> Self {
        self.key_source = Some(Arc::new(source));
        self
    }

    pub fn with_shared_key_source(mut self, source: Arc<dyn KeySource>) -> Self {
        self.key_source = Some(source);
        self
    }

    /// Shorthand for `with_key_source(StaticKey::new(passphrase))`.
    pub fn with_passphrase(self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.with_key_source(StaticKey::new(passphrase))
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_modes(mut self, modes: ModeRegistry) -> Self {
        self.modes = modes;
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("salt", &self.salt.as_ref().map(|s| s.len()))
            .field("key_source", &self.key_source.as_ref().map(|_| "[REDACTED]"))
            .field("format", &self.format)
            .field("modes", &self.modes)
            .finish()
    }
}

/// Call-scoped state: the options plus a lazily derived key.
///
/// The key source is consulted at most once per context, and only when a
/// block actually needs the key.
pub struct CipherContext<'o> {
    options: &'o Options,
    key: Option<DerivedKey>,
}

impl<'o> CipherContext<'o> {
    pub fn new(options: &'o Options) -> Self {
        Self { options, key: None }
    }

    pub fn options(&self) -> &'o Options {
        self.options
    }

    pub fn key(&mut self) -> CodecResult<&DerivedKey> {
        let key = match self.key.take() {
            Some(key) => key,
            None => {
                let source = self
                    .options
                    .key_source
                    .as_ref()
                    .ok_or(CodecError::NoKeySource)?;
                let passphrase = source.passphrase().map_err(CodecError::KeySource)?;
                tracing::debug!(custom_salt = self.options.salt.is_some(), "deriving cipher key");
                derive_key(&passphrase, self.options.salt.as_deref())
            }
        };
        Ok(self.key.insert(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_no_key_source() {
        let options = Options::new();
        let mut ctx = CipherContext::new(&options);
        assert!(matches!(ctx.key(), Err(CodecError::NoKeySource)));
    }

    #[test]
    fn test_key_source_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let options = Options::new().with_key_source(move || -> anyhow::Result<Vec<u8>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(b"pw".to_vec())
        });

        let mut ctx = CipherContext::new(&options);
        let first = *ctx.key().unwrap().as_bytes();
        let second = *ctx.key().unwrap().as_bytes();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A fresh context derives again
        let mut other = CipherContext::new(&options);
        other.key().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_key_source_error_propagates() {
        let options =
            Options::new().with_key_source(|| -> anyhow::Result<Vec<u8>> { anyhow::bail!("locked") });
        let mut ctx = CipherContext::new(&options);
        let err = ctx.key().unwrap_err();
        assert!(matches!(err, CodecError::KeySource(_)));
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_salt_changes_key() {
        let a = Options::new().with_passphrase("pw");
        let b = Options::new().with_passphrase("pw").with_salt(b"other".to_vec());
        let ka = *CipherContext::new(&a).key().unwrap().as_bytes();
        let kb = *CipherContext::new(&b).key().unwrap().as_bytes();
        assert_ne!(ka, kb);
    }

    #[test]
    fn test_env_key_missing_var() {
        let source = EnvKey::new("JSEAL_TEST_DEFINITELY_UNSET_VAR");
        assert!(source.passphrase().is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let options = Options::new().with_passphrase("hunter2");
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("REDACTED"));
        assert_eq!(format!("{:?}", StaticKey::new("hunter2")), "StaticKey([REDACTED])");
    }
}
