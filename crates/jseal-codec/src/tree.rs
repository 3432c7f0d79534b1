//! Block operations on documents with no Rust type behind them.
//!
//! Blocks are addressed by JSON pointer (RFC 6901). The walk does not descend
//! into a block, and an opened payload is not searched for further blocks.

use jseal_core::{CodecError, CodecResult};

use crate::block::CryptBlock;
use crate::context::CipherContext;
use crate::format::{parse_payload, render_payload};
use crate::mode::ModeRegistry;
use crate::value::{escape_token, Value};

/// Where a block sits in a document and what it claims to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub pointer: String,
    pub mode: String,
    /// Length of the sealed bytes after base64 decoding
    pub len: usize,
}

/// Every block in `tree` whose mode is in `modes`, in document order.
pub fn blocks(tree: &Value, modes: &ModeRegistry) -> Vec<BlockInfo> {
    let mut found = Vec::new();
    collect(tree, modes, String::new(), &mut found);
    found
}

fn collect(node: &Value, modes: &ModeRegistry, pointer: String, found: &mut Vec<BlockInfo>) {
    if let Some(block) = CryptBlock::recognize(node, modes) {
        found.push(BlockInfo {
            pointer,
            mode: block.mode,
            len: block.data.len(),
        });
        return;
    }
    match node {
        Value::Object(object) => {
            for (key, child) in object {
                collect(child, modes, format!("{pointer}/{}", escape_token(key)), found);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect(child, modes, format!("{pointer}/{index}"), found);
            }
        }
        _ => {}
    }
}

fn block_at<'t>(tree: &'t mut Value, pointer: &str) -> CodecResult<(&'t mut Value, CryptBlock)> {
    let node = tree
        .pointer_mut(pointer)
        .ok_or_else(|| CodecError::MissingPath(pointer.to_string()))?;
    let block = CryptBlock::parse(node)?;
    Ok((node, block))
}

/// Replace every block with the value sealed inside it.
///
/// Returns the number of blocks opened. On error the tree may be partly
/// opened; callers working on a file should discard it.
pub fn open_all(tree: &mut Value, ctx: &mut CipherContext<'_>) -> CodecResult<usize> {
    let found = blocks(tree, &ctx.options().modes);
    for info in &found {
        let (node, block) = block_at(tree, &info.pointer)?;
        let raw = block.raw_data(ctx)?;
        *node = parse_payload(&raw)?;
        tracing::debug!(pointer = %info.pointer, mode = %info.mode, "opened block");
    }
    Ok(found.len())
}

/// Re-seal every keyed block: open with `from`, seal again with `to`.
///
/// Blocks whose mode uses no key (`none`) are left as they are. Returns the
/// number of blocks re-sealed.
pub fn reseal(
    tree: &mut Value,
    from: &mut CipherContext<'_>,
    to: &mut CipherContext<'_>,
) -> CodecResult<usize> {
    let mut resealed = 0;
    for info in blocks(tree, &from.options().modes) {
        if !from.options().modes.get(&info.mode)?.needs_key() {
            continue;
        }
        let (node, block) = block_at(tree, &info.pointer)?;
        let raw = block.raw_data(from)?;
        *node = CryptBlock::seal(&block.mode, &raw, to)?.to_value();
        resealed += 1;
        tracing::debug!(pointer = %info.pointer, mode = %info.mode, "resealed block");
    }
    Ok(resealed)
}

/// Seal the plaintext value at `pointer` under `mode`.
///
/// Returns `false` without touching anything if the value already is a block.
/// An object shaped like a block but naming an unregistered mode is plain data
/// and gets sealed.
pub fn seal_path(
    tree: &mut Value,
    pointer: &str,
    mode: &str,
    ctx: &mut CipherContext<'_>,
) -> CodecResult<bool> {
    let node = tree
        .pointer_mut(pointer)
        .ok_or_else(|| CodecError::MissingPath(pointer.to_string()))?;
    if CryptBlock::is_block(node, &ctx.options().modes) {
        return Ok(false);
    }

    let payload = render_payload(node)?;
    *node = CryptBlock::seal(mode, &payload, ctx)?.to_value();
    tracing::debug!(pointer, mode, "sealed value");
    Ok(true)
}
