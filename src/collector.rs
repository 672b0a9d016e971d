use alloc::vec::Vec;

use crate::cache::HeaderCache;
use crate::cursor::Cursor;
use crate::depth::DepthGuard;
use crate::error::{Error, ErrorKind, Result};
use crate::header::{check_eoc, read_header, HeaderOutcome};
use crate::length::Length;
use crate::tag::Class;

/// Grow-only byte buffer used to reassemble constructed primitives (spec
/// §3, "Collector buffer").
#[derive(Debug, Default)]
pub struct Collector {
    buf: Vec<u8>,
}

impl Collector {
    pub fn new() -> Self {
        Collector { buf: Vec::new() }
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// C3: walk the body of a constructed (possibly nested, possibly indefinite)
/// encoding, either skipping it or gathering its leaf octets into `out`.
///
/// Spec §4.3, preserved verbatim including the deliberate policy note: when
/// reassembling a constructed string the inner components are only required
/// to be universal class with *any* tag (`inner_tag = Tag::ANY`), matching
/// the "OCTET STRING internally" convention — more permissive than strict
/// X.690 but intentional.
pub fn collect(
    mut out: Option<&mut Collector>,
    cursor: &mut Cursor<'_>,
    length: Length,
    indefinite: bool,
    inner_tag: i32,
    inner_class: Class,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<()> {
    if out.is_none() && !indefinite {
        let n = length.definite()?;
        cursor.take(n)?;
        return Ok(());
    }

    let _token = depth.enter()?;

    if indefinite {
        loop {
            if check_eoc(cursor) {
                return Ok(());
            }
            if cursor.is_empty() {
                return Err(Error::simple(ErrorKind::MissingEOC));
            }
            walk_one(out.as_deref_mut(), cursor, inner_tag, inner_class, cache, depth)?;
        }
    }

    // Definite length with a buffer to fill: carve out exactly `length`
    // bytes from the outer cursor and walk that sub-range in isolation, so
    // a sibling field after this one is never mistaken for part of it.
    let n = length.definite()?;
    let sub_bytes = cursor.take(n)?;
    let mut sub_cursor = Cursor::new(sub_bytes);
    while !sub_cursor.is_empty() {
        if check_eoc(&mut sub_cursor) {
            return Err(Error::simple(ErrorKind::UnexpectedEOC));
        }
        walk_one(out.as_deref_mut(), &mut sub_cursor, inner_tag, inner_class, cache, depth)?;
    }
    Ok(())
}

/// Read one inner TLV and either recurse into it (constructed) or copy/skip
/// its content octets (primitive).
fn walk_one(
    out: Option<&mut Collector>,
    cursor: &mut Cursor<'_>,
    inner_tag: i32,
    inner_class: Class,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<()> {
    match read_header(cursor, inner_tag, inner_class, false, cache)? {
        HeaderOutcome::Absent => unreachable!("read_header with optional=false never returns Absent"),
        HeaderOutcome::Present(h) => {
            if h.constructed {
                collect(
                    out,
                    cursor,
                    h.length,
                    !h.length.is_definite(),
                    inner_tag,
                    inner_class,
                    cache,
                    depth,
                )
            } else {
                let n = h.length.definite()?;
                let bytes = cursor.take(n)?;
                if let Some(buf) = out {
                    buf.extend_from_slice(bytes);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn definite_skip_without_buffer() {
        let buf = hex!("AB CD FF");
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let depth = DepthGuard::new(64);
        collect(
            None,
            &mut cursor,
            Length::Definite(2),
            false,
            -1,
            Class::Universal,
            &mut cache,
            &depth,
        )
        .unwrap();
        assert_eq!(cursor.consumed(), 2);
    }

    #[test]
    fn indefinite_constructed_octet_string_is_flattened() {
        let body = hex!("04 02 AB CD 04 01 EF 00 00");
        let mut cursor = Cursor::new(&body);
        let mut cache = HeaderCache::new();
        let depth = DepthGuard::new(64);
        let mut out = Collector::new();
        collect(
            Some(&mut out),
            &mut cursor,
            Length::Indefinite,
            true,
            -1,
            Class::Universal,
            &mut cache,
            &depth,
        )
        .unwrap();
        assert_eq!(out.into_vec(), alloc::vec![0xAB, 0xCD, 0xEF]);
        assert_eq!(cursor.consumed(), body.len());
    }

    #[test]
    fn missing_eoc_is_an_error() {
        let body = hex!("04 02 AB CD 04 01 EF");
        let mut cursor = Cursor::new(&body);
        let mut cache = HeaderCache::new();
        let depth = DepthGuard::new(64);
        let mut out = Collector::new();
        let err = collect(
            Some(&mut out),
            &mut cursor,
            Length::Indefinite,
            true,
            -1,
            Class::Universal,
            &mut cache,
            &depth,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingEOC));
    }

    #[test]
    fn definite_constructed_body_does_not_overrun_into_sibling() {
        // constructed string body of exactly 4 bytes (04 02 AB CD), followed
        // by sibling bytes that must be left untouched.
        let mut buf = hex!("04 02 AB CD").to_vec();
        buf.extend_from_slice(&hex!("FF FF"));
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let depth = DepthGuard::new(64);
        let mut out = Collector::new();
        collect(
            Some(&mut out),
            &mut cursor,
            Length::Definite(4),
            false,
            -1,
            Class::Universal,
            &mut cache,
            &depth,
        )
        .unwrap();
        assert_eq!(out.into_vec(), alloc::vec![0xAB, 0xCD]);
        assert_eq!(cursor.consumed(), 4);
        assert_eq!(cursor.as_bytes(), &hex!("FF FF"));
    }
}
