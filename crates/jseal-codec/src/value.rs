//! The generic value model shared by the walker and the text formats.
//!
//! `serde_json::Value` already is the closed variant set the codec needs
//! (null, bool, number, string, list, object); the `preserve_order` feature
//! keeps object keys in declared field order when rendering.

pub use serde_json::{Map, Number, Value};

/// Short description of a value's kind, used in assignment errors.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(_) => "string".into(),
        Value::Array(items) => format!("list of {}", items.len()),
        Value::Object(_) => "object".into(),
    }
}

/// Escape one JSON-pointer reference token (RFC 6901).
pub(crate) fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Value::Null), "null");
        assert_eq!(describe(&json!(300)), "number 300");
        assert_eq!(describe(&json!("x")), "string");
        assert_eq!(describe(&json!([1, 2])), "list of 2");
        assert_eq!(describe(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_escape_token() {
        assert_eq!(escape_token("a/b~c"), "a~1b~0c");
        assert_eq!(escape_token("plain"), "plain");
    }

    #[test]
    fn test_object_keeps_insertion_order() {
        let mut object = Map::new();
        object.insert("zeta".into(), json!(1));
        object.insert("alpha".into(), json!(2));
        let rendered = serde_json::to_string(&Value::Object(object)).unwrap();
        assert_eq!(rendered, r#"{"zeta":1,"alpha":2}"#);
    }
}
