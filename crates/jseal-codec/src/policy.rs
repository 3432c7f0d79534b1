//! The crypto field policy
//!
//! A field tagged with a mode is replaced, on encode, by a block holding its
//! value rendered as compact JSON and sealed by that mode. On decode the block
//! is opened, its payload parsed, and the result walked into the field.
//!
//! A tagged field that holds a bare string instead of a block is legacy
//! plaintext from before the field was encrypted. It is assigned as-is and
//! never touches the key source.

use jseal_core::CodecResult;

use crate::block::CryptBlock;
use crate::context::{CipherContext, Options};
use crate::decode::{Decode, Decoder};
use crate::encode::{Encode, Encoder};
use crate::field::{Field, FieldHandler};
use crate::format::{parse_payload, render_payload};
use crate::value::Value;

pub struct CryptoPolicy<'o> {
    ctx: CipherContext<'o>,
}

impl<'o> CryptoPolicy<'o> {
    pub fn new(options: &'o Options) -> Self {
        Self {
            ctx: CipherContext::new(options),
        }
    }

    /// Resolve a field's mode tag, rejecting tags no registered mode answers to.
    fn mode_of(&self, field: &Field) -> CodecResult<Option<&'static str>> {
        match field.mode {
            Some(mode) => {
                self.ctx.options().modes.get(mode)?;
                Ok(Some(mode))
            }
            None => Ok(None),
        }
    }
}

impl FieldHandler for CryptoPolicy<'_> {
    fn encode_field(&mut self, field: &Field, value: &dyn Encode) -> CodecResult<Option<Value>> {
        let Some(mode) = self.mode_of(field)? else {
            return Ok(None);
        };

        let nested = Encoder::plain().encode(value)?;
        let payload = render_payload(&nested)?;
        let block = CryptBlock::seal(mode, &payload, &mut self.ctx)?;
        Ok(Some(block.to_value()))
    }

    fn decode_field(
        &mut self,
        field: &Field,
        src: &Value,
        dst: &mut dyn Decode,
    ) -> CodecResult<bool> {
        if self.mode_of(field)?.is_none() {
            return Ok(false);
        }

        if src.is_string() {
            tracing::debug!(field = field.name, "legacy plaintext in encrypted field");
            dst.decode_into(src, &mut Decoder::plain())?;
            return Ok(true);
        }

        let block = CryptBlock::parse(src)?;
        let raw = block.raw_data(&mut self.ctx)?;
        let nested = parse_payload(&raw)?;
        dst.decode_into(&nested, &mut Decoder::plain())?;
        Ok(true)
    }
}
