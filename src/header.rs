use nom::bytes::streaming::take;
use nom::number::streaming::be_u8;

use crate::cache::{CachedHeader, HeaderCache};
use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Result};
use crate::length::Length;
use crate::tag::{Class, Tag};

/// Result of a [`read_header`] probe: either a consumed, matching header, or
/// a distinguished "absent" outcome when the field was OPTIONAL and the tag
/// did not match (spec §4.1, step 3).
#[derive(Debug)]
pub enum HeaderOutcome {
    Present(CachedHeader),
    Absent,
}

/// Parse one BER tag + length octet sequence from `input`, following X.690
/// 8.1.2/8.1.3. Grounded on the teacher crate's `parse_header`, adapted to
/// operate on a plain byte slice view of a [`Cursor`] instead of its
/// `nom`-`Input` wrapper type.
fn parse_raw_header(input: &[u8]) -> core::result::Result<(&[u8], CachedHeader), ()> {
    let start_len = input.len();

    let (rem, b0) = be_u8::<_, nom::error::Error<&[u8]>>(input).map_err(|_| ())?;

    let class = Class::from_bits(b0 >> 6);
    const CONSTRUCTED_BIT: u8 = 0b0010_0000;
    let constructed = (b0 & CONSTRUCTED_BIT) != 0;

    const TAG_MASK0: u8 = 0b0001_1111;
    let tag0 = b0 & TAG_MASK0;

    let mut rem = rem;
    let mut tag: u32 = u32::from(tag0);
    if tag0 == TAG_MASK0 {
        // high-tag-number form (X.690 8.1.2.4.2): base-128 continuation octets
        let mut c: u32 = 0;
        let mut count = 0;
        loop {
            let (r, b) = be_u8::<_, nom::error::Error<&[u8]>>(rem).map_err(|_| ())?;
            rem = r;
            count += 1;
            if count > 5 {
                return Err(());
            }
            c = (c << 7) | (u32::from(b) & 0x7f);
            if b & 0x80 == 0 {
                break;
            }
        }
        tag = c;
    }

    let (rem, len_b0) = be_u8::<_, nom::error::Error<&[u8]>>(rem).map_err(|_| ())?;
    const INDEFINITE: u8 = 0b1000_0000;
    let (rem, length) = if len_b0 == INDEFINITE {
        if !constructed {
            return Err(());
        }
        (rem, Length::Indefinite)
    } else if len_b0 & INDEFINITE == 0 {
        (rem, Length::Definite(len_b0 as usize))
    } else {
        if len_b0 == 0xff {
            return Err(());
        }
        let (rem, len_bytes) =
            take::<_, _, nom::error::Error<&[u8]>>(len_b0 & !INDEFINITE)(rem).map_err(|_| ())?;
        let mut l: u64 = 0;
        for &b in len_bytes {
            if l & 0xff00_0000_0000_0000 != 0 {
                return Err(());
            }
            l = (l << 8) | u64::from(b);
        }
        let l = usize::try_from(l).map_err(|_| ())?;
        (rem, Length::Definite(l))
    };

    let header_len = start_len - rem.len();
    Ok((
        rem,
        CachedHeader {
            tag: Tag(tag),
            class,
            constructed,
            length,
            header_len,
        },
    ))
}

/// C1: read one TLV header at the cursor, consulting/filling `cache`.
///
/// Implements spec §4.1 exactly:
/// 1. reuse the cache if valid, else parse a fresh header;
/// 2. malformed header -> `BadObjectHeader`, cache cleared;
/// 3. `expected_tag >= 0` mismatch -> absent (if `optional`, cache kept
///    valid) or `WrongTag` (cache cleared);
/// 4. on success, cache cleared (consumed) and cursor advanced past the
///    header;
/// 5. indefinite length carries no content-length of its own — the caller
///    computes an upper bound from the cursor's remaining length.
pub fn read_header(
    cursor: &mut Cursor<'_>,
    expected_tag: i32,
    expected_class: Class,
    optional: bool,
    cache: &mut HeaderCache,
) -> Result<HeaderOutcome> {
    let header = match cache.get().copied() {
        Some(h) => h,
        None => match parse_raw_header(cursor.as_bytes()) {
            Ok((_, h)) => h,
            Err(()) => {
                cache.invalidate();
                return Err(Error::simple(ErrorKind::BadObjectHeader));
            }
        },
    };

    if expected_tag >= 0 {
        let expected_tag_u32 = expected_tag as u32;
        if header.tag.0 != expected_tag_u32 || header.class != expected_class {
            if optional {
                cache.store(header);
                return Ok(HeaderOutcome::Absent);
            }
            cache.invalidate();
            return Err(Error::unexpected_tag(
                Some(Tag(expected_tag_u32)),
                header.tag,
            ));
        }
    }

    cache.invalidate();
    cursor.advance(header.header_len);
    Ok(HeaderOutcome::Present(header))
}

/// Peek the header at the cursor without consuming it, filling (or reusing)
/// the cache. Unlike [`read_header`], this never advances the cursor and
/// never fails on a tag mismatch, because it imposes no tag expectation —
/// used by MSTRING (spec §4.5), which must inspect a header's tag/class
/// before deciding which concrete type to commit to.
pub fn peek_header(cursor: &Cursor<'_>, cache: &mut HeaderCache) -> Result<CachedHeader> {
    if let Some(h) = cache.get() {
        return Ok(*h);
    }
    match parse_raw_header(cursor.as_bytes()) {
        Ok((_, h)) => {
            cache.store(h);
            Ok(h)
        }
        Err(()) => {
            cache.invalidate();
            Err(Error::simple(ErrorKind::BadObjectHeader))
        }
    }
}

/// Succeeds iff at least 2 bytes remain and they are the EOC marker
/// `0x00 0x00`, consuming them. Does not touch the header cache: EOC is not
/// a TLV header.
pub fn check_eoc(cursor: &mut Cursor<'_>) -> bool {
    let bytes = cursor.as_bytes();
    if bytes.len() >= 2 && bytes[0] == 0x00 && bytes[1] == 0x00 {
        cursor.advance(2);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn reads_short_form_header() {
        let buf = hex!("02 01 07");
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let outcome =
            read_header(&mut cursor, Tag::Integer.0 as i32, Class::Universal, false, &mut cache)
                .unwrap();
        match outcome {
            HeaderOutcome::Present(h) => {
                assert_eq!(h.tag, Tag::Integer);
                assert_eq!(h.length, Length::Definite(1));
            }
            HeaderOutcome::Absent => panic!("expected Present"),
        }
        assert_eq!(cursor.consumed(), 2);
        assert!(!cache.is_valid());
    }

    #[test]
    fn optional_mismatch_is_absent_and_caches() {
        let buf = hex!("01 01 FF");
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let outcome =
            read_header(&mut cursor, Tag::Integer.0 as i32, Class::Universal, true, &mut cache)
                .unwrap();
        assert!(matches!(outcome, HeaderOutcome::Absent));
        assert_eq!(cursor.consumed(), 0, "cursor must not advance on absent");
        assert!(cache.is_valid(), "mismatched probe must keep cache valid");

        // second probe reuses the cached header without re-parsing
        let outcome2 =
            read_header(&mut cursor, Tag::Boolean.0 as i32, Class::Universal, false, &mut cache)
                .unwrap();
        assert!(matches!(outcome2, HeaderOutcome::Present(_)));
        assert_eq!(cursor.consumed(), 2);
    }

    #[test]
    fn mandatory_mismatch_is_wrong_tag() {
        let buf = hex!("01 01 FF");
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let err =
            read_header(&mut cursor, Tag::Integer.0 as i32, Class::Universal, false, &mut cache)
                .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::WrongTag { .. }));
        assert!(!cache.is_valid());
    }

    #[test]
    fn long_form_length() {
        // tag=SEQUENCE constructed, long-form length of 0x0100 (256) bytes
        let mut buf = vec![0x30u8, 0x82, 0x01, 0x00];
        buf.extend(core::iter::repeat(0u8).take(256));
        let mut cursor = Cursor::new(&buf);
        let mut cache = HeaderCache::new();
        let outcome =
            read_header(&mut cursor, Tag::Sequence.0 as i32, Class::Universal, false, &mut cache)
                .unwrap();
        match outcome {
            HeaderOutcome::Present(h) => assert_eq!(h.length, Length::Definite(256)),
            HeaderOutcome::Absent => panic!("expected Present"),
        }
    }

    #[test]
    fn check_eoc_consumes_marker() {
        let buf = hex!("00 00 FF");
        let mut cursor = Cursor::new(&buf);
        assert!(check_eoc(&mut cursor));
        assert_eq!(cursor.consumed(), 2);
    }

    #[test]
    fn check_eoc_rejects_other_bytes() {
        let buf = hex!("01 02");
        let mut cursor = Cursor::new(&buf);
        assert!(!check_eoc(&mut cursor));
        assert_eq!(cursor.consumed(), 0);
    }
}
