//! Field annotations and the per-field interception protocol.
//!
//! Record types bind each Rust field to a [`Field`] descriptor with the
//! [`record!`](crate::record) macro. A bare entry, or one built from
//! [`Field::auto`], takes its external name from the Rust identifier:
//!
//! ```
//! use jseal_codec::{record, Field};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Login {
//!     host: String,
//!     user: String,
//!     pass: String,
//!     cached_token: String,
//! }
//!
//! record!(Login {
//!     host: Field::new("Host"),
//!     user,
//!     pass: Field::auto().encrypted("aes"),
//!     cached_token: Field::auto().skipped(),
//! });
//! ```

use jseal_core::CodecResult;

use crate::decode::Decode;
use crate::encode::Encode;
use crate::value::Value;

/// Metadata attached to one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Key used in the object tree
    pub name: &'static str,
    /// Excluded from both directions; never shown to a handler
    pub skip: bool,
    /// Encryption mode tag, e.g. `"aes"`
    pub mode: Option<&'static str>,
}

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            skip: false,
            mode: None,
        }
    }

    /// A field named after its Rust identifier once listed in
    /// [`record!`](crate::record).
    pub const fn auto() -> Self {
        Self::new("")
    }

    /// Fill in `name` if none was given.
    pub const fn or_name(self, name: &'static str) -> Self {
        if self.name.is_empty() {
            Self { name, ..self }
        } else {
            self
        }
    }

    /// Route the field through the named cipher mode.
    ///
    /// Any mode in the registry is accepted. Tagging a field `"none"` writes
    /// a block whose data is the plaintext payload.
    pub const fn encrypted(self, mode: &'static str) -> Self {
        Self {
            mode: Some(mode),
            ..self
        }
    }

    pub const fn skipped(self) -> Self {
        Self { skip: true, ..self }
    }
}

/// A struct-like type with a declared field table.
pub trait Record {
    const NAME: &'static str;
    const FIELDS: &'static [Field];

    /// Descriptor for an external field name, if declared.
    fn field(name: &str) -> Option<&'static Field> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

/// Hook consulted for every non-skipped record field.
///
/// Returning `None` / `false` leaves the field to the walker.
pub trait FieldHandler {
    fn encode_field(&mut self, field: &Field, value: &dyn Encode) -> CodecResult<Option<Value>>;

    fn decode_field(
        &mut self,
        field: &Field,
        src: &Value,
        dst: &mut dyn Decode,
    ) -> CodecResult<bool>;
}

/// Implement [`Record`], [`Encode`] and [`Decode`] for a struct.
///
/// Fields are listed in the order they should appear in the encoded object.
/// Struct fields left out of the list are neither encoded nor decoded. An
/// entry without a descriptor is `Field::new(stringify!(field))`.
#[macro_export]
macro_rules! record {
    (@field $field:ident) => {
        $crate::Field::new(stringify!($field))
    };
    (@field $field:ident : $desc:expr) => {
        ($desc).or_name(stringify!($field))
    };
    ($ty:ident { $($field:ident $(: $desc:expr)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            const NAME: &'static str = stringify!($ty);
            const FIELDS: &'static [$crate::Field] =
                &[$($crate::record!(@field $field $(: $desc)?)),*];
        }

        impl $crate::Encode for $ty {
            fn encode(
                &self,
                enc: &mut $crate::Encoder<'_>,
            ) -> $crate::CodecResult<$crate::Value> {
                let mut object = $crate::Map::new();
                $(
                    enc.encode_field(
                        &mut object,
                        &$crate::record!(@field $field $(: $desc)?),
                        &self.$field,
                    )?;
                )*
                Ok($crate::Value::Object(object))
            }
        }

        impl $crate::Decode for $ty {
            fn decode_into(
                &mut self,
                src: &$crate::Value,
                dec: &mut $crate::Decoder<'_>,
            ) -> $crate::CodecResult<()> {
                let object = dec.expect_object(src, <Self as $crate::Record>::NAME)?;
                $(
                    dec.decode_field(
                        object,
                        &$crate::record!(@field $field $(: $desc)?),
                        &mut self.$field,
                    )?;
                )*
                Ok(())
            }
        }
    };
}
