pub mod config;
pub mod error;
pub mod types;

pub use error::{is_wrong_passphrase, CodecError, CodecResult};
pub use types::Format;
