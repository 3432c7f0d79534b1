use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Format;

/// Top-level tool configuration (loaded from jseal.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsealConfig {
    pub codec: CodecConfig,
    pub key: KeyConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Base64 (standard, padded or not) salt for PBKDF2. When unset the
    /// compiled-in default salt is used, which anyone with the source knows.
    pub salt_b64: Option<String>,
    /// Format used when a file extension does not decide it
    pub format: Format,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Environment variable holding the passphrase
    pub env: String,
    /// Prompt on the terminal when the variable is unset
    pub prompt: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            env: "JSEAL_PASSPHRASE".into(),
            prompt: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl JsealConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[codec]
salt_b64 = "c2FsdHk="
format = "yaml"

[key]
env = "MY_PASSPHRASE"
prompt = false

[log]
level = "debug"
format = "json"
"#;
        let config: JsealConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.codec.salt_b64.as_deref(), Some("c2FsdHk="));
        assert_eq!(config.codec.format, Format::Yaml);
        assert_eq!(config.key.env, "MY_PASSPHRASE");
        assert!(!config.key.prompt);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_parse_defaults() {
        let config: JsealConfig = toml::from_str("").unwrap();

        assert!(config.codec.salt_b64.is_none());
        assert_eq!(config.codec.format, Format::Json);
        assert_eq!(config.key.env, "JSEAL_PASSPHRASE");
        assert!(config.key.prompt);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[key]
env = "OTHER"
"#;
        let config: JsealConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.key.env, "OTHER");
        // Defaults
        assert!(config.key.prompt);
        assert_eq!(config.log.format, "text");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = JsealConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.key.env, "JSEAL_PASSPHRASE");
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jseal.toml");
        std::fs::write(&path, "[codec\nformat = ").unwrap();
        let err = JsealConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = JsealConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: JsealConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.key.env, parsed.key.env);
        assert_eq!(config.log.level, parsed.log.level);
        assert_eq!(config.codec.format, parsed.codec.format);
    }
}
