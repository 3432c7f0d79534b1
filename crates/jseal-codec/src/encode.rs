//! Typed value → generic tree
//!
//! Shape dispatch is static: every supported shape implements [`Encode`].
//!
//! | shape                      | result                                   |
//! |----------------------------|------------------------------------------|
//! | `Option<T>`, `Box<T>`      | `null` when absent, else the inner value |
//! | record (`record!`)         | object keyed by external field names     |
//! | `[T; N]`, `Vec<T>`, `[T]`  | list of the same length                  |
//! | bool, integers, floats, `String`, `str` | passed through              |
//! | `HashMap`, `BTreeMap`      | `UnsupportedShape`                       |

use std::collections::{BTreeMap, HashMap};

use jseal_core::{CodecError, CodecResult};

use crate::field::{Field, FieldHandler};
use crate::value::{Map, Value};

pub trait Encode {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value>;
}

/// Walks a value into a [`Value`] tree, offering record fields to a handler.
pub struct Encoder<'h> {
    handler: Option<&'h mut dyn FieldHandler>,
}

impl Encoder<'static> {
    /// An encoder without a field handler: annotations other than the
    /// external name and skip flag are ignored.
    pub fn plain() -> Self {
        Self { handler: None }
    }
}

impl<'h> Encoder<'h> {
    pub fn with_handler(handler: &'h mut dyn FieldHandler) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> CodecResult<Value> {
        value.encode(self)
    }

    /// Encode one record field into `object`.
    ///
    /// Skipped fields are dropped before the handler sees them. A value
    /// returned by the handler is used verbatim.
    pub fn encode_field<T: Encode>(
        &mut self,
        object: &mut Map<String, Value>,
        field: &Field,
        value: &T,
    ) -> CodecResult<()> {
        if field.skip {
            return Ok(());
        }

        let replaced = match self.handler.as_mut() {
            Some(handler) => handler.encode_field(field, value)?,
            None => None,
        };

        let encoded = match replaced {
            Some(encoded) => {
                tracing::trace!(field = field.name, mode = ?field.mode, "field replaced by handler");
                encoded
            }
            None => value.encode(self)?,
        };

        object.insert(field.name.to_string(), encoded);
        Ok(())
    }
}

impl Encode for bool {
    fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
        Ok(Value::Bool(*self))
    }
}

macro_rules! encode_integer {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
                    Ok(Value::from(*self))
                }
            }
        )*
    };
}

encode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! encode_float {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
                    if !self.is_finite() {
                        return Err(CodecError::UnsupportedShape(format!(
                            "non-finite float {self}"
                        )));
                    }
                    Ok(Value::from(*self))
                }
            }
        )*
    };
}

encode_float!(f32, f64);

impl Encode for str {
    fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
        Ok(Value::String(self.to_owned()))
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        self.as_str().encode(enc)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        match self {
            Some(inner) => inner.encode(enc),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        (**self).encode(enc)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        (**self).encode(enc)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        self.iter()
            .map(|item| item.encode(enc))
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> CodecResult<Value> {
        self.as_slice().encode(enc)
    }
}

impl<K, V, S> Encode for HashMap<K, V, S> {
    fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
        Err(CodecError::UnsupportedShape("maps are not supported".into()))
    }
}

impl<K, V> Encode for BTreeMap<K, V> {
    fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
        Err(CodecError::UnsupportedShape("maps are not supported".into()))
    }
}

/// Dynamic subtrees pass through untouched.
impl Encode for Value {
    fn encode(&self, _enc: &mut Encoder<'_>) -> CodecResult<Value> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain<T: Encode + ?Sized>(value: &T) -> CodecResult<Value> {
        Encoder::plain().encode(value)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(plain("foo bar").unwrap(), json!("foo bar"));
        assert_eq!(plain(&1337i32).unwrap(), json!(1337));
        assert_eq!(plain(&-5i8).unwrap(), json!(-5));
        assert_eq!(plain(&u64::MAX).unwrap(), json!(u64::MAX));
        assert_eq!(plain(&4.2f64).unwrap(), json!(4.2));
        assert_eq!(plain(&true).unwrap(), json!(true));
        assert_eq!(plain(&false).unwrap(), json!(false));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = plain(&f64::NAN).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedShape(_)));
    }

    #[test]
    fn test_sequences() {
        assert_eq!(plain(&["foo", "bar"]).unwrap(), json!(["foo", "bar"]));
        assert_eq!(plain(&vec![1u8, 2, 3]).unwrap(), json!([1, 2, 3]));
        assert_eq!(plain(&Vec::<u8>::new()).unwrap(), json!([]));
    }

    #[test]
    fn test_pointers() {
        assert_eq!(plain(&Option::<String>::None).unwrap(), Value::Null);
        assert_eq!(plain(&Some("x".to_string())).unwrap(), json!("x"));
        assert_eq!(plain(&Box::new(7u16)).unwrap(), json!(7));
        assert_eq!(plain(&Some(Box::new(Some(1i64)))).unwrap(), json!(1));
    }

    #[test]
    fn test_maps_rejected() {
        let mut map = HashMap::new();
        map.insert("k".to_string(), 1);
        assert!(matches!(plain(&map), Err(CodecError::UnsupportedShape(_))));

        let tree: BTreeMap<String, String> = BTreeMap::new();
        assert!(matches!(plain(&tree), Err(CodecError::UnsupportedShape(_))));
    }

    #[test]
    fn test_map_inside_list_rejected() {
        let nested = vec![HashMap::<String, i32>::new()];
        assert!(matches!(plain(&nested), Err(CodecError::UnsupportedShape(_))));
    }

    #[test]
    fn test_value_passthrough() {
        let tree = json!({"a": [1, null, "x"]});
        assert_eq!(plain(&tree).unwrap(), tree);
    }
}
