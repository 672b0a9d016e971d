use alloc::boxed::Box;

use crate::cache::HeaderCache;
use crate::codec::{lookup_codec, AsnString};
use crate::collector::{collect, Collector};
use crate::cursor::Cursor;
use crate::depth::DepthGuard;
use crate::error::{Error, ErrorKind, Result};
use crate::header::{read_header, HeaderOutcome};
use crate::length::Length;
use crate::tag::{Class, Tag};
use crate::value::Value;

const STRING_TAGS: &[Tag] = &[
    Tag::OctetString,
    Tag::Utf8String,
    Tag::NumericString,
    Tag::PrintableString,
    Tag::T61String,
    Tag::VideotexString,
    Tag::Ia5String,
    Tag::UtcTime,
    Tag::GeneralizedTime,
    Tag::GraphicString,
    Tag::VisibleString,
    Tag::GeneralString,
    Tag::UniversalString,
    Tag::CharacterString,
    Tag::BmpString,
    Tag::ObjectDescriptor,
];

fn is_string_tag(tag: Tag) -> bool {
    STRING_TAGS.contains(&tag)
}

/// Read exactly `length` content octets from `cursor`, reassembling them
/// first if the encoding is constructed (spec §4.3).
pub(crate) fn read_body(
    cursor: &mut Cursor<'_>,
    length: Length,
    constructed: bool,
    inner_tag: i32,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<alloc::vec::Vec<u8>> {
    if !constructed {
        let n = length.definite()?;
        return Ok(cursor.take(n)?.to_vec());
    }
    let mut out = Collector::new();
    collect(
        Some(&mut out),
        cursor,
        length,
        !length.is_definite(),
        inner_tag,
        Class::Universal,
        cache,
        depth,
    )?;
    Ok(out.into_vec())
}

/// C4: decode one primitive value, having already read its header.
///
/// Grounded on OpenSSL's `asn1_ex_c2i`/`asn1_find_end` dispatch in
/// `tasn_dec.c`: SEQUENCE/SET and any value whose tag carries no registered
/// codec fall back to the "OTHER" case of keeping the literal bytes (spec
/// §4.4 step 3, default case); BIT STRING, BOOLEAN, INTEGER, ENUMERATED,
/// NULL, OBJECT IDENTIFIER go through [`crate::codec::lookup_codec`]; the
/// string family (OCTET STRING, character strings, UTCTime,
/// GeneralizedTime) is handled uniformly as an [`AsnString`], with
/// constructed encodings reassembled through [`collect`] first.
///
/// `class` is the header's actual tag class. A concrete, template-driven
/// call always passes `Class::Universal` here — the template's own type
/// dictates dispatch regardless of an IMPLICIT override's wire class; only
/// [`decode_any`]'s ANY-wildcard path passes the header's discovered class
/// through unchanged, per spec §4.4 step 1 ("If class ≠ universal, treat as
/// OTHER").
pub fn decode_primitive(
    cursor: &mut Cursor<'_>,
    tag: Tag,
    class: Class,
    length: Length,
    constructed: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<Value> {
    if !class.is_universal() {
        let n = length.definite()?;
        let bytes = cursor.take(n)?;
        return Ok(Value::Raw(bytes.to_vec()));
    }

    if is_string_tag(tag) {
        let bytes = read_body(cursor, length, constructed, Tag::ANY, cache, depth)?;
        return Ok(Value::String(AsnString::new(tag, bytes)));
    }

    // SEQUENCE/SET require the constructed form (spec §4.4 step 2); every
    // registered codec tag (BOOLEAN/INTEGER/NULL/OID/BIT STRING/ENUMERATED)
    // requires the primitive form instead.
    if tag == Tag::Sequence || tag == Tag::Set {
        if !constructed {
            return Err(Error::simple(ErrorKind::TypeNotConstructed));
        }
        let n = length.definite()?;
        let bytes = cursor.take(n)?;
        return Ok(Value::Raw(bytes.to_vec()));
    }

    if let Some(decode) = lookup_codec(tag) {
        if constructed {
            return Err(Error::simple(ErrorKind::TypeNotConstructed));
        }
        let n = length.definite()?;
        let bytes = cursor.take(n)?;
        return decode(bytes);
    }

    // any other universal tag with no registered codec: keep the verbatim
    // content octets (spec §4.4 step 3, default case).
    let n = length.definite()?;
    let bytes = cursor.take(n)?;
    Ok(Value::Raw(bytes.to_vec()))
}

/// Decode an ANY value: read whatever header is present (no tag constraint),
/// and wrap the decoded payload together with the discovered tag (spec §4.4
/// step 1).
///
/// Per spec §7, ANY is illegal both under an explicit/implicit tag override
/// and as an OPTIONAL field — callers enforce those before calling this.
pub fn decode_any(
    cursor: &mut Cursor<'_>,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<Value> {
    match read_header(cursor, Tag::ANY, Class::Universal, false, cache)? {
        HeaderOutcome::Absent => unreachable!("read_header with optional=false never returns Absent"),
        HeaderOutcome::Present(h) => {
            let payload = decode_primitive(cursor, h.tag, h.class, h.length, h.constructed, cache, depth)?;
            Ok(Value::Any {
                discriminant: h.tag,
                payload: Box::new(payload),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn fresh() -> (HeaderCache, DepthGuard) {
        (HeaderCache::new(), DepthGuard::new(64))
    }

    #[test]
    fn decodes_primitive_octet_string() {
        let buf = hex!("AB CD EF");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let v = decode_primitive(
            &mut cursor,
            Tag::OctetString,
            Class::Universal,
            Length::Definite(3),
            false,
            &mut cache,
            &depth,
        )
        .unwrap();
        match v {
            Value::String(s) => assert_eq!(s.as_bytes(), &hex!("AB CD EF")),
            _ => panic!("expected String"),
        }
    }

    #[test]
    fn reassembles_constructed_octet_string() {
        let buf = hex!("04 02 AB CD 04 01 EF 00 00");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let v = decode_primitive(
            &mut cursor,
            Tag::OctetString,
            Class::Universal,
            Length::Indefinite,
            true,
            &mut cache,
            &depth,
        )
        .unwrap();
        match v {
            Value::String(s) => assert_eq!(s.as_bytes(), &hex!("AB CD EF")),
            _ => panic!("expected String"),
        }
    }

    #[test]
    fn constructed_sequence_falls_back_to_raw() {
        let buf = hex!("02 01 07");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let v = decode_primitive(
            &mut cursor,
            Tag::Sequence,
            Class::Universal,
            Length::Definite(3),
            true,
            &mut cache,
            &depth,
        )
        .unwrap();
        assert_eq!(v, Value::Raw(hex!("02 01 07").to_vec()));
    }

    #[test]
    fn primitive_form_sequence_is_rejected() {
        let buf = hex!("02 01 07");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let err = decode_primitive(
            &mut cursor,
            Tag::Sequence,
            Class::Universal,
            Length::Definite(3),
            false,
            &mut cache,
            &depth,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeNotConstructed));
    }

    #[test]
    fn constructed_integer_is_rejected() {
        let buf = hex!("07");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let err = decode_primitive(
            &mut cursor,
            Tag::Integer,
            Class::Universal,
            Length::Definite(1),
            true,
            &mut cache,
            &depth,
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeNotConstructed));
    }

    #[test]
    fn any_wraps_discovered_tag() {
        let buf = hex!("01 01 FF");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let v = decode_any(&mut cursor, &mut cache, &depth).unwrap();
        match v {
            Value::Any { discriminant, payload } => {
                assert_eq!(discriminant, Tag::Boolean);
                assert_eq!(*payload, Value::Boolean(true));
            }
            _ => panic!("expected Any"),
        }
    }

    #[test]
    fn any_with_non_universal_class_is_opaque() {
        // context-specific, primitive, tag number 1 (coincides with
        // Tag::Boolean) -- must not be run through Boolean::decode.
        let buf = hex!("81 01 FF");
        let mut cursor = Cursor::new(&buf);
        let (mut cache, mut depth) = fresh();
        let v = decode_any(&mut cursor, &mut cache, &depth).unwrap();
        match v {
            Value::Any { discriminant, payload } => {
                assert_eq!(discriminant, Tag::Boolean);
                assert_eq!(*payload, Value::Raw(hex!("FF").to_vec()));
            }
            _ => panic!("expected Any"),
        }
    }
}
