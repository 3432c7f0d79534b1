//! Text rendering of value trees.
//!
//! The outer document follows [`Format`]; payloads sealed inside a block are
//! always compact JSON so a block can move between JSON and YAML documents.

use jseal_core::{CodecError, CodecResult, Format};

use crate::value::Value;

pub fn render(value: &Value, format: Format) -> CodecResult<Vec<u8>> {
    match format {
        Format::Json => render_payload(value),
        Format::Yaml => serde_yml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| CodecError::Syntax(format!("rendering yaml: {e}"))),
    }
}

pub fn parse(text: &[u8], format: Format) -> CodecResult<Value> {
    match format {
        Format::Json => parse_payload(text),
        Format::Yaml => {
            let text = std::str::from_utf8(text)
                .map_err(|e| CodecError::Syntax(format!("yaml is not utf-8: {e}")))?;
            serde_yml::from_str(text).map_err(|e| CodecError::Syntax(e.to_string()))
        }
    }
}

/// Compact JSON, the form sealed inside blocks.
pub(crate) fn render_payload(value: &Value) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CodecError::Syntax(format!("rendering json: {e}")))
}

pub(crate) fn parse_payload(bytes: &[u8]) -> CodecResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Syntax(e.to_string()))
}
