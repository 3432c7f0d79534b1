//! Generic tree → typed value
//!
//! Decoding writes into an existing value. Keys absent from the source leave
//! the target untouched, which is what lets [`crate::decode_into`] layer a
//! document over pre-populated defaults.

use std::collections::{BTreeMap, HashMap};

use jseal_core::{CodecError, CodecResult};

use crate::field::{Field, FieldHandler};
use crate::value::{describe, Map, Value};

pub trait Decode {
    fn decode_into(&mut self, src: &Value, dec: &mut Decoder<'_>) -> CodecResult<()>;
}

/// Walks a [`Value`] tree into typed targets, offering record fields to a
/// handler first.
pub struct Decoder<'h> {
    handler: Option<&'h mut dyn FieldHandler>,
}

impl Decoder<'static> {
    pub fn plain() -> Self {
        Self { handler: None }
    }
}

impl<'h> Decoder<'h> {
    pub fn with_handler(handler: &'h mut dyn FieldHandler) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn decode<T: Decode + ?Sized>(&mut self, src: &Value, dst: &mut T) -> CodecResult<()> {
        dst.decode_into(src, self)
    }

    /// The object backing a record, or an assignment error naming the record.
    pub fn expect_object<'v>(
        &self,
        src: &'v Value,
        record: &'static str,
    ) -> CodecResult<&'v Map<String, Value>> {
        src.as_object()
            .ok_or_else(|| CodecError::assignment(record, describe(src)))
    }

    /// Decode one record field out of `object`.
    ///
    /// Skipped fields and keys missing from the source are left alone.
    pub fn decode_field<T: Decode>(
        &mut self,
        object: &Map<String, Value>,
        field: &Field,
        dst: &mut T,
    ) -> CodecResult<()> {
        if field.skip {
            return Ok(());
        }
        let Some(src) = object.get(field.name) else {
            return Ok(());
        };

        if let Some(handler) = self.handler.as_mut() {
            if handler.decode_field(field, src, dst)? {
                tracing::trace!(field = field.name, mode = ?field.mode, "field decoded by handler");
                return Ok(());
            }
        }

        dst.decode_into(src, self)
    }
}

impl Decode for bool {
    fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        match src {
            Value::Bool(b) => {
                *self = *b;
                Ok(())
            }
            other => Err(CodecError::assignment("bool", describe(other))),
        }
    }
}

/// Integral value of a number, accepting floats with no fractional part.
fn integral(src: &Value) -> Option<i128> {
    let Value::Number(n) = src else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.into());
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38).then_some(f as i128)
}

macro_rules! decode_integer {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
                    let value = integral(src)
                        .and_then(|i| <$ty>::try_from(i).ok())
                        .ok_or_else(|| CodecError::assignment(stringify!($ty), describe(src)))?;
                    *self = value;
                    Ok(())
                }
            }
        )*
    };
}

decode_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Decode for f64 {
    fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        *self = src
            .as_f64()
            .ok_or_else(|| CodecError::assignment("f64", describe(src)))?;
        Ok(())
    }
}

impl Decode for f32 {
    fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        let narrowed = src
            .as_f64()
            .map(|f| f as f32)
            .filter(|f| f.is_finite())
            .ok_or_else(|| CodecError::assignment("f32", describe(src)))?;
        *self = narrowed;
        Ok(())
    }
}

impl Decode for String {
    fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        match src {
            Value::String(s) => {
                self.clone_from(s);
                Ok(())
            }
            other => Err(CodecError::assignment("string", describe(other))),
        }
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode_into(&mut self, src: &Value, dec: &mut Decoder<'_>) -> CodecResult<()> {
        if src.is_null() {
            *self = None;
            return Ok(());
        }
        self.get_or_insert_with(T::default).decode_into(src, dec)
    }
}

impl<T: Decode + Default> Decode for Box<T> {
    fn decode_into(&mut self, src: &Value, dec: &mut Decoder<'_>) -> CodecResult<()> {
        if src.is_null() {
            **self = T::default();
            return Ok(());
        }
        (**self).decode_into(src, dec)
    }
}

/// Copies `min(source, N)` elements; the rest of the array is not touched.
impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode_into(&mut self, src: &Value, dec: &mut Decoder<'_>) -> CodecResult<()> {
        let items = src
            .as_array()
            .ok_or_else(|| CodecError::assignment("array", describe(src)))?;
        if items.len() > N {
            tracing::trace!(source = items.len(), capacity = N, "truncating list into array");
        }
        for (slot, item) in self.iter_mut().zip(items) {
            slot.decode_into(item, dec)?;
        }
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode_into(&mut self, src: &Value, dec: &mut Decoder<'_>) -> CodecResult<()> {
        let items = src
            .as_array()
            .ok_or_else(|| CodecError::assignment("list", describe(src)))?;
        self.clear();
        self.resize_with(items.len(), T::default);
        for (slot, item) in self.iter_mut().zip(items) {
            slot.decode_into(item, dec)?;
        }
        Ok(())
    }
}

impl<K, V, S> Decode for HashMap<K, V, S> {
    fn decode_into(&mut self, _src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        Err(CodecError::UnsupportedShape("maps are not supported".into()))
    }
}

impl<K, V> Decode for BTreeMap<K, V> {
    fn decode_into(&mut self, _src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        Err(CodecError::UnsupportedShape("maps are not supported".into()))
    }
}

impl Decode for Value {
    fn decode_into(&mut self, src: &Value, _dec: &mut Decoder<'_>) -> CodecResult<()> {
        self.clone_from(src);
        Ok(())
    }
}
