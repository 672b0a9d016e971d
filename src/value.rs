use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::codec::AsnString;
use crate::tag::Tag;
use crate::template::Template;

/// The decoded value tree.
///
/// Spec §3 treats the value tree as opaque to the core, reachable only
/// through an "assignable slot" interface (`new`, `free`, `set_choice
/// selector`, `field_ptr` — spec §6). This crate gives that tree one
/// concrete, safe shape instead of a caller-supplied allocator: ownership
/// is plain Rust `Box`/`Vec`, so "free on error" is simply `Drop`. The four
/// operations from §6 still exist as the [`Aggregate`] trait below,
/// implemented once for `Value` itself, keeping the seam visible.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// ASN.1 `NULL`: the sentinel "present" value, carrying no data.
    Null,
    /// ASN.1 `BOOLEAN`.
    Boolean(bool),
    /// ASN.1 `INTEGER` / `ENUMERATED`, as a fixed-width signed integer.
    /// Values wider than 128 bits are rejected with `IntegerTooLarge`
    /// before reaching this representation, unless the `bigint` feature is
    /// enabled, in which case they decode as [`Value::BigInteger`] instead.
    Integer(i128),
    /// ASN.1 `INTEGER` / `ENUMERATED` wider than 128 bits (`bigint` feature
    /// only).
    #[cfg(feature = "bigint")]
    BigInteger(num_bigint::BigInt),
    /// ASN.1 `OBJECT IDENTIFIER`, decoded into its arc sequence.
    ObjectIdentifier(Vec<u64>),
    /// ASN.1 `BIT STRING`, as an MSB0 bit vector with the unused trailing
    /// bits already truncated off. Grounded on the teacher's `bitstring.rs`,
    /// which represents `BitString` the same way over `bitvec::BitVec`.
    BitString(bitvec::vec::BitVec<u8, bitvec::order::Msb0>),
    /// `OCTET STRING` and the character-string family, plus UTCTime /
    /// GeneralizedTime, all represented with their universal tag recorded.
    String(AsnString),
    /// The ANY wildcard: the discovered universal tag plus the decoded
    /// payload, per spec §4.4 step 1 ("wrap the result in a two-field
    /// aggregate").
    Any { discriminant: Tag, payload: Box<Value> },
    /// SEQUENCE/SET/ANY-of-universal-class "OTHER" fallback: the literal
    /// outer-tag-to-end encoding, kept verbatim (spec §4.4 step 3, default
    /// case).
    Raw(Vec<u8>),
    /// A decoded SEQUENCE (or SET used as a fixed-shape aggregate): each
    /// entry is this type's static field name plus the decoded value, or
    /// `None` for an absent OPTIONAL field.
    Sequence(Vec<(&'static str, Option<Value>)>),
    /// A decoded CHOICE: which alternative matched, plus its value.
    Choice { selector: usize, value: Box<Value> },
    /// SEQUENCE OF / SET OF: a homogeneous, ordered collection.
    CollectionOf(Vec<Value>),
}

impl Value {
    pub fn as_sequence(&self) -> Option<&[(&'static str, Option<Value>)]> {
        match self {
            Value::Sequence(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_sequence()?
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, v)| v.as_ref())
    }
}

/// The external "aggregate operations" collaborator from spec §6:
/// `new(template) -> slot`, `free(slot, template)`, `field_ptr(aggregate,
/// field) -> slot`, `set_choice_selector(aggregate, index, template)`.
///
/// Implemented once, for [`Value`] itself, since this crate supplies a
/// concrete value tree rather than leaving allocation to the caller.
pub trait Aggregate: Sized {
    /// Allocate an empty aggregate for `template` (a SEQUENCE's field list,
    /// or a CHOICE's alternative list).
    fn new_aggregate(template: &Template) -> Self;

    /// Mutable access to the slot for field `index`, allocating the
    /// aggregate first if `self` does not already hold one.
    fn field_slot(&mut self, template: &Template, index: usize) -> &mut Option<Value>;

    /// Record which CHOICE alternative was selected and store its value.
    fn set_choice(&mut self, index: usize, value: Value);
}

impl Aggregate for Option<Value> {
    fn new_aggregate(template: &Template) -> Self {
        match template.kind {
            crate::template::ItemKind::Choice => None,
            _ => Some(Value::Sequence(
                template
                    .fields
                    .iter()
                    .map(|f| (f.name, None))
                    .collect(),
            )),
        }
    }

    fn field_slot(&mut self, template: &Template, index: usize) -> &mut Option<Value> {
        if self.is_none() {
            *self = Self::new_aggregate(template);
        }
        match self {
            Some(Value::Sequence(fields)) => &mut fields[index].1,
            _ => unreachable!("field_slot called on a non-Sequence aggregate"),
        }
    }

    fn set_choice(&mut self, index: usize, value: Value) {
        *self = Some(Value::Choice {
            selector: index,
            value: Box::new(value),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup() {
        let v = Value::Sequence(alloc::vec![
            ("a", Some(Value::Integer(7))),
            ("b", None),
        ]);
        assert_eq!(v.field("a"), Some(&Value::Integer(7)));
        assert_eq!(v.field("b"), None);
        assert_eq!(v.field("missing"), None);
    }
}
