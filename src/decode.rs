use crate::cache::HeaderCache;
use crate::cursor::Cursor;
use crate::depth::DepthGuard;
use crate::error::{Error, ErrorKind, Result};
use crate::template::{decode_item, DecodeStatus, Template};
use crate::value::Value;

/// Tunables for a decode call. The only one named in spec §5: a recursion
/// depth cap, defending against adversarial or malformed inputs (Open
/// Question (iii), spec §9).
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub max_depth: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { max_depth: 64 }
    }
}

/// Top-level entry point (spec §6): decode `bytes` against `template`,
/// returning the value tree and the number of bytes consumed.
pub fn decode(template: &'static Template, bytes: &[u8]) -> Result<(Value, usize)> {
    decode_with_options(template, bytes, DecodeOptions::default())
}

/// As [`decode`], with a caller-chosen recursion depth cap.
pub fn decode_with_options(
    template: &'static Template,
    bytes: &[u8],
    options: DecodeOptions,
) -> Result<(Value, usize)> {
    let mut cursor = Cursor::new(bytes);
    let mut cache = HeaderCache::new();
    let depth = DepthGuard::new(options.max_depth);
    match decode_item(&mut cursor, template, None, false, &mut cache, &depth)? {
        DecodeStatus::Present(value) => Ok((value, cursor.consumed())),
        DecodeStatus::Absent => unreachable!("decode_item with optional=false never returns Absent"),
    }
}

/// As [`decode`], but writes into a caller-supplied slot instead of
/// returning a fresh [`Value`] (spec §6: "a variant that also accepts a
/// pre-existing destination slot so the caller can reuse allocations").
/// Returns the number of bytes consumed.
pub fn decode_with_slot(
    template: &'static Template,
    bytes: &[u8],
    slot: &mut Value,
) -> Result<usize> {
    let (value, consumed) = decode(template, bytes)?;
    *slot = value;
    Ok(consumed)
}
