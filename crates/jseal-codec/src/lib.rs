//! jseal-codec: typed values to JSON/YAML documents with per-field encryption
//!
//! Types declare their field table once with [`record!`]. Encoding walks the
//! value into a [`Value`] tree; fields tagged with a mode are replaced by a
//! sealed block. Decoding reverses it.
//!
//! ```
//! use jseal_codec::{record, Field, Options};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Account {
//!     user: String,
//!     token: String,
//! }
//!
//! record!(Account {
//!     user: Field::new("User"),
//!     token: Field::new("Token").encrypted("aes"),
//! });
//!
//! let options = Options::new().with_passphrase("correct horse");
//! let account = Account { user: "ops".into(), token: "t0k3n".into() };
//!
//! let text = jseal_codec::encode(&account, &options).unwrap();
//! assert!(!String::from_utf8_lossy(&text).contains("t0k3n"));
//!
//! let back: Account = jseal_codec::decode(&text, &options).unwrap();
//! assert_eq!(back, account);
//! ```
//!
//! Module layout:
//! - [`value`]: the generic tree (`serde_json::Value`)
//! - [`field`]: annotations, [`Record`], [`FieldHandler`], [`record!`]
//! - [`encode`](mod@encode) / [`decode`](mod@decode): the tree walker
//! - [`mode`], [`block`], [`context`], [`policy`]: blocks and how they are sealed
//! - [`format`], [`fs`]: text and file I/O
//! - [`tree`]: block operations on untyped documents

pub mod block;
pub mod context;
pub mod decode;
pub mod encode;
pub mod field;
pub mod format;
pub mod fs;
pub mod mode;
pub mod policy;
pub mod tree;
pub mod value;

pub use block::CryptBlock;
pub use context::{CipherContext, EnvKey, KeySource, Options, StaticKey};
pub use decode::{Decode, Decoder};
pub use encode::{Encode, Encoder};
pub use field::{Field, FieldHandler, Record};
pub use fs::{decode_from_file, encode_to_file};
pub use jseal_core::{is_wrong_passphrase, CodecError, CodecResult, Format};
pub use mode::{AesMode, CipherMode, ModeRegistry, PlainMode, AES_MODE, PLAIN_MODE};
pub use policy::CryptoPolicy;
pub use value::{Map, Value};

/// Encode `value` into a tree, sealing tagged fields.
pub fn to_value<T: Encode + ?Sized>(value: &T, options: &Options) -> CodecResult<Value> {
    let mut policy = CryptoPolicy::new(options);
    Encoder::with_handler(&mut policy).encode(value)
}

/// Decode a tree into a fresh `T::default()`.
pub fn from_value<T: Decode + Default>(tree: &Value, options: &Options) -> CodecResult<T> {
    let mut out = T::default();
    let mut policy = CryptoPolicy::new(options);
    Decoder::with_handler(&mut policy).decode(tree, &mut out)?;
    Ok(out)
}

/// Encode `value` to text in `options.format`.
pub fn encode<T: Encode + ?Sized>(value: &T, options: &Options) -> CodecResult<Vec<u8>> {
    let tree = to_value(value, options)?;
    format::render(&tree, options.format)
}

/// Decode text in `options.format` into a fresh `T::default()`.
pub fn decode<T: Decode + Default>(text: &[u8], options: &Options) -> CodecResult<T> {
    let tree = format::parse(text, options.format)?;
    from_value(&tree, options)
}

/// Decode text over an existing value. Fields missing from the text keep
/// their current contents.
///
/// `target` is only replaced once the whole document decoded.
pub fn decode_into<T: Decode + Clone>(
    text: &[u8],
    target: &mut T,
    options: &Options,
) -> CodecResult<()> {
    let tree = format::parse(text, options.format)?;
    let mut staged = target.clone();
    let mut policy = CryptoPolicy::new(options);
    Decoder::with_handler(&mut policy).decode(&tree, &mut staged)?;
    *target = staged;
    Ok(())
}
