use serde::{Deserialize, Serialize};

/// Textual tree format used for a sealed document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Compact JSON (the default, and the only format used inside blocks)
    #[default]
    Json,
    /// YAML document
    Yaml,
}

impl Format {
    /// Format implied by a file extension, if the extension names one.
    pub fn from_extension(ext: Option<&str>) -> Option<Self> {
        ext?.parse().ok()
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            other => Err(format!("unknown format {other:?} (expected json or yaml)")),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}
