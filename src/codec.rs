use alloc::vec::Vec;

use crate::error::{Error, ErrorKind, Result};
use crate::tag::Tag;
use crate::value::Value;

/// `OCTET STRING` / character-string / time value, holding the universal
/// tag it was decoded under alongside its raw content octets.
///
/// Grounded on the teacher crate's per-type string modules
/// (`octetstring.rs`, `strings.rs`, `utctime.rs`, `generalizedtime.rs`),
/// which each wrap a tag-specific newtype around a byte/str buffer; this
/// crate collapses that family into one struct since spec §4.4 step 3
/// treats them uniformly ("allocate or reuse an `AsnString` of the given
/// universal tag").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsnString {
    pub tag: Tag,
    pub data: Vec<u8>,
}

impl AsnString {
    pub fn new(tag: Tag, data: Vec<u8>) -> Self {
        AsnString { tag, data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Interpret the content as UTF-8, for the string tags where that's a
    /// meaningful operation (everything except OCTET STRING, which is
    /// arbitrary binary).
    pub fn as_str(&self) -> Result<&str> {
        core::str::from_utf8(&self.data).map_err(|_| Error::simple(ErrorKind::StringInvalidCharset))
    }
}

/// External value-codec contract (spec §6): `c2i(slot, bytes_ptr_ref,
/// length) -> bool`. Implemented here as `decode(bytes) -> Result<Value>`,
/// the safe-Rust equivalent — the boolean success flag becomes `Result`,
/// and "may advance the bytes pointer" does not apply because each codec
/// receives exactly its own content octets (C4 has already delimited them).
pub trait ValueCodec {
    const TAG: Tag;
    fn decode(bytes: &[u8]) -> Result<Value>;
}

/// ASN.1 `BOOLEAN`. Grounded on the teacher's `boolean.rs`: content must be
/// exactly one octet (spec §4.4 step 3, §8 boundary scenario 2).
pub struct Boolean;

impl ValueCodec for Boolean {
    const TAG: Tag = Tag::Boolean;

    fn decode(bytes: &[u8]) -> Result<Value> {
        match bytes {
            [b] => Ok(Value::Boolean(*b != 0)),
            _ => Err(Error::simple(ErrorKind::BooleanIsWrongLength)),
        }
    }
}

/// ASN.1 `NULL`. Grounded on the teacher's `null.rs`: content must be empty
/// (spec §8 boundary scenario 1).
pub struct Null;

impl ValueCodec for Null {
    const TAG: Tag = Tag::Null;

    fn decode(bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            Ok(Value::Null)
        } else {
            Err(Error::simple(ErrorKind::NullIsWrongLength))
        }
    }
}

/// Decode a two's-complement big-endian INTEGER/ENUMERATED body into an
/// `i128`, grounded on the teacher's `decode_array_int`/`is_highest_bit_set`
/// pattern in `integer.rs`.
fn decode_signed_integer(bytes: &[u8]) -> Result<i128> {
    if bytes.is_empty() {
        return Err(Error::simple(ErrorKind::IntegerTooLarge));
    }
    if bytes.len() > 16 {
        return Err(Error::simple(ErrorKind::IntegerTooLarge));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = if negative { [0xffu8; 16] } else { [0u8; 16] };
    let offset = 16 - bytes.len();
    buf[offset..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buf))
}

/// Decode an INTEGER/ENUMERATED body, widening to [`Value::BigInteger`]
/// past 128 bits when the `bigint` feature is enabled (mirroring the
/// teacher's own `bigint` feature, which exists for exactly this case:
/// INTEGER has no width limit in X.690).
fn decode_integer_value(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Err(Error::simple(ErrorKind::IntegerTooLarge));
    }
    if bytes.len() <= 16 {
        return decode_signed_integer(bytes).map(Value::Integer);
    }
    #[cfg(feature = "bigint")]
    {
        Ok(Value::BigInteger(num_bigint::BigInt::from_signed_bytes_be(bytes)))
    }
    #[cfg(not(feature = "bigint"))]
    {
        Err(Error::simple(ErrorKind::IntegerTooLarge))
    }
}

/// ASN.1 `INTEGER`.
pub struct Integer;

impl ValueCodec for Integer {
    const TAG: Tag = Tag::Integer;

    fn decode(bytes: &[u8]) -> Result<Value> {
        decode_integer_value(bytes)
    }
}

/// ASN.1 `ENUMERATED`. Same wire shape as INTEGER; spec §4.4 step 3 groups
/// them explicitly ("INTEGER/ENUMERATED, including the negative sentinels").
pub struct Enumerated;

impl ValueCodec for Enumerated {
    const TAG: Tag = Tag::Enumerated;

    fn decode(bytes: &[u8]) -> Result<Value> {
        decode_integer_value(bytes)
    }
}

/// ASN.1 `OBJECT IDENTIFIER`, grounded on the teacher's `oid.rs` base-128
/// arc decoding.
pub struct ObjectIdentifier;

impl ValueCodec for ObjectIdentifier {
    const TAG: Tag = Tag::Oid;

    fn decode(bytes: &[u8]) -> Result<Value> {
        if bytes.is_empty() {
            return Err(Error::simple(ErrorKind::InvalidObjectIdentifier));
        }
        let mut arcs = Vec::new();
        // first byte encodes the first two arcs as `40*X + Y`
        let first = bytes[0];
        arcs.push((first / 40) as u64);
        arcs.push((first % 40) as u64);
        let mut value: u64 = 0;
        let mut have_digits = false;
        for &b in &bytes[1..] {
            have_digits = true;
            value = value
                .checked_shl(7)
                .ok_or_else(|| Error::simple(ErrorKind::InvalidObjectIdentifier))?
                | u64::from(b & 0x7f);
            if b & 0x80 == 0 {
                arcs.push(value);
                value = 0;
                have_digits = false;
            }
        }
        if have_digits {
            return Err(Error::simple(ErrorKind::InvalidObjectIdentifier));
        }
        Ok(Value::ObjectIdentifier(arcs))
    }
}

/// ASN.1 `BIT STRING`, grounded on the teacher's `bitstring.rs`: the first
/// content octet counts unused bits in the final byte of the rest, which are
/// truncated off the `bitvec::BitVec` built from the remaining octets
/// (mirroring `BitString::new` in the teacher).
pub struct BitString;

impl ValueCodec for BitString {
    const TAG: Tag = Tag::BitString;

    fn decode(bytes: &[u8]) -> Result<Value> {
        use bitvec::order::Msb0;
        use bitvec::vec::BitVec;

        let (unused_bits, rest) = bytes
            .split_first()
            .ok_or_else(|| Error::simple(ErrorKind::InvalidObjectIdentifier))?;
        if *unused_bits > 7 || (*unused_bits > 0 && rest.is_empty()) {
            return Err(Error::simple(ErrorKind::InvalidObjectIdentifier));
        }
        let mut bits = BitVec::<u8, Msb0>::from_slice(rest);
        bits.truncate(bits.len() - *unused_bits as usize);
        Ok(Value::BitString(bits))
    }
}

/// Dispatch table entry point mirroring the role of OpenSSL's
/// `ASN1_PRIMITIVE_FUNCS.c2i` lookup by universal tag (spec §6).
pub fn lookup_codec(tag: Tag) -> Option<fn(&[u8]) -> Result<Value>> {
    match tag {
        Tag::Boolean => Some(Boolean::decode),
        Tag::Null => Some(Null::decode),
        Tag::Integer => Some(Integer::decode),
        Tag::Enumerated => Some(Enumerated::decode),
        Tag::Oid => Some(ObjectIdentifier::decode),
        Tag::BitString => Some(BitString::decode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_values() {
        assert_eq!(Boolean::decode(&[0xff]).unwrap(), Value::Boolean(true));
        assert_eq!(Boolean::decode(&[0x00]).unwrap(), Value::Boolean(false));
        assert!(Boolean::decode(&[0xff, 0xff]).is_err());
    }

    #[test]
    fn null_requires_empty_body() {
        assert_eq!(Null::decode(&[]).unwrap(), Value::Null);
        assert!(Null::decode(&[0x00]).is_err());
    }

    #[cfg(feature = "bigint")]
    #[test]
    fn integer_wider_than_128_bits_uses_bigint() {
        let bytes = [0x01u8; 17];
        match Integer::decode(&bytes).unwrap() {
            Value::BigInteger(n) => {
                assert_eq!(n, num_bigint::BigInt::from_signed_bytes_be(&bytes));
            }
            other => panic!("expected BigInteger, got {other:?}"),
        }
    }

    #[cfg(not(feature = "bigint"))]
    #[test]
    fn integer_wider_than_128_bits_errors_without_bigint() {
        let bytes = [0x01u8; 17];
        assert!(Integer::decode(&bytes).is_err());
    }

    #[test]
    fn integer_sign_extends() {
        assert_eq!(Integer::decode(&[0x07]).unwrap(), Value::Integer(7));
        assert_eq!(Integer::decode(&[0x2A]).unwrap(), Value::Integer(42));
        assert_eq!(Integer::decode(&[0xff]).unwrap(), Value::Integer(-1));
        assert_eq!(Integer::decode(&[0x00, 0x80]).unwrap(), Value::Integer(128));
    }

    #[test]
    fn oid_basic() {
        // 1.2.840.113549 (rsadsi)
        let bytes = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d];
        let v = ObjectIdentifier::decode(&bytes).unwrap();
        assert_eq!(v, Value::ObjectIdentifier(alloc::vec![1, 2, 840, 113549]));
    }

    #[test]
    fn bitstring_unused_bits() {
        let v = BitString::decode(&[0x04, 0xF0]).unwrap();
        match v {
            Value::BitString(bits) => {
                assert_eq!(bits.len(), 4);
                assert_eq!(
                    bits.iter().by_vals().collect::<alloc::vec::Vec<bool>>(),
                    alloc::vec![true, true, true, true]
                );
            }
            other => panic!("expected BitString, got {other:?}"),
        }
    }

    #[test]
    fn bitstring_rejects_bad_unused_bits_count() {
        assert!(BitString::decode(&[0x08]).is_err());
        assert!(BitString::decode(&[0x01]).is_err());
    }
}
