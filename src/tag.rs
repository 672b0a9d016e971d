use rusticata_macros::newtype_enum;

/// BER/DER Tag number, as defined in X.680 section 8.4.
///
/// X.690 doesn't specify a maximum tag size, so a `u32` is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag(pub u32);

newtype_enum! {
impl display Tag {
    EndOfContent = 0,
    Boolean = 1,
    Integer = 2,
    BitString = 3,
    OctetString = 4,
    Null = 5,
    Oid = 6,
    ObjectDescriptor = 7,
    External = 8,
    RealType = 9,
    Enumerated = 10,
    EmbeddedPdv = 11,
    Utf8String = 12,
    RelativeOid = 13,

    Sequence = 16,
    Set = 17,
    NumericString = 18,
    PrintableString = 19,
    T61String = 20,
    TeletexString = 20,
    VideotexString = 21,

    Ia5String = 22,
    UtcTime = 23,
    GeneralizedTime = 24,

    GraphicString = 25,
    VisibleString = 26,
    GeneralString = 27,

    UniversalString = 28,
    CharacterString = 29,
    BmpString = 30,
}
}

impl Tag {
    /// Sentinel meaning "any tag number", used by the ANY wildcard and by
    /// CHOICE/OPTIONAL probing (spec §4.4, §4.5).
    pub const ANY: i32 = -1;
}

impl From<u32> for Tag {
    fn from(v: u32) -> Self {
        Tag(v)
    }
}

/// BER/DER tag class, as defined in X.690 section 8.1.2.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Class {
    Universal = 0b00,
    Application = 0b01,
    ContextSpecific = 0b10,
    Private = 0b11,
}

impl Class {
    #[inline]
    pub const fn from_bits(b: u8) -> Self {
        match b & 0b11 {
            0b00 => Class::Universal,
            0b01 => Class::Application,
            0b10 => Class::ContextSpecific,
            _ => Class::Private,
        }
    }

    #[inline]
    pub const fn is_universal(&self) -> bool {
        matches!(self, Class::Universal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_equality() {
        assert_eq!(Tag::Integer, Tag(2));
        assert_ne!(Tag::Integer, Tag::Boolean);
    }

    #[test]
    fn class_from_bits() {
        assert_eq!(Class::from_bits(0b00), Class::Universal);
        assert_eq!(Class::from_bits(0b10), Class::ContextSpecific);
        assert!(Class::Universal.is_universal());
        assert!(!Class::Private.is_universal());
    }
}
