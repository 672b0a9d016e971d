use alloc::vec::Vec;

use crate::cache::HeaderCache;
use crate::cursor::Cursor;
use crate::debug::log_trace;
use crate::depth::DepthGuard;
use crate::error::{Error, ErrorKind, Result};
use crate::header::{check_eoc, peek_header, read_header, HeaderOutcome};
use crate::primitive::{decode_any, decode_primitive, read_body};
use crate::tag::{Class, Tag};
use crate::value::{Aggregate, Value};

/// Which of the six template shapes `spec.md` §3 names a [`Template`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Primitive,
    MultiString,
    Sequence,
    Choice,
    Extern,
    Compat,
}

/// Flag bits on a [`FieldTemplate`], one per tagging/repetition/optionality
/// concern named in spec §3. A small bitset rather than a teacher-style
/// `bitflags!` crate dependency, since the teacher does not carry one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(pub u16);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const EXPLICIT: Flags = Flags(1 << 0);
    pub const IMPLICIT: Flags = Flags(1 << 1);
    pub const SET_OF: Flags = Flags(1 << 2);
    pub const SEQUENCE_OF: Flags = Flags(1 << 3);
    pub const OPTIONAL: Flags = Flags(1 << 4);

    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Where a decoded field's value goes inside the parent aggregate. In this
/// crate the aggregate is always a `Value::Sequence`'s field vector, so the
/// offset is simply that vector's index rather than a byte offset into a
/// caller-defined struct (spec §3's "field-offset descriptor").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOffset(pub usize);

/// External `ex_d2i` entry point for [`ItemKind::Extern`] templates (spec
/// §4.5 "Extern"): same signature as [`decode_item`], called through
/// verbatim with its return code passed through.
pub type ExternFn = fn(
    &mut Cursor<'_>,
    &'static Template,
    Option<(i32, Class)>,
    bool,
    &mut HeaderCache,
    &DepthGuard,
) -> Result<DecodeStatus>;

/// Legacy value-codec entry point for [`ItemKind::Compat`] templates (spec
/// §4.5 "Compat"), operating directly on content octets.
pub type CompatFn = fn(&[u8]) -> Result<Value>;

/// One entry in a SEQUENCE's or CHOICE's field list (spec §3 "Field
/// template"). The same shape serves both roles, as in the teacher corpus's
/// OpenSSL ancestor, where `ASN1_TEMPLATE` is reused for both.
#[derive(Clone, Copy, Debug)]
pub struct FieldTemplate {
    pub template: &'static Template,
    pub flags: Flags,
    pub tag_class: Class,
    pub tag_number: Option<u32>,
    pub name: &'static str,
    pub offset: FieldOffset,
    /// ADB (any-defined-by): re-selects the effective inner template based
    /// on an already-decoded sibling field (spec §9).
    pub adb: Option<fn(&Value) -> &'static Template>,
}

/// A CHOICE alternative. Structurally identical to [`FieldTemplate`].
pub type ChoiceField = FieldTemplate;

/// A template record (spec §3): the data that drives decoding, built by
/// hand as `const`/`static` values rather than by a macro compiler (see
/// `DESIGN.md`).
#[derive(Debug)]
pub struct Template {
    pub kind: ItemKind,
    pub type_name: &'static str,
    /// For `Primitive`: `None` means the ANY wildcard; `Some(tag)` names the
    /// concrete universal type. Unused for other kinds.
    pub primitive_tag: Option<Tag>,
    /// For `MultiString`: the bitmap of acceptable universal tags.
    pub accepted_tags: &'static [Tag],
    /// For `Sequence`/`Choice`: the ordered field list.
    pub fields: &'static [FieldTemplate],
    /// Auxiliary pre/post-decode hooks (spec §3); `false` means "refused".
    pub pre_decode: Option<fn(&Value) -> bool>,
    pub post_decode: Option<fn(&Value) -> bool>,
    pub ex_d2i: Option<ExternFn>,
    pub compat: Option<CompatFn>,
}

impl Template {
    /// Convenience constructor for a concrete primitive template (the most
    /// common shape: a universal tag with no field-list shim).
    pub const fn primitive(type_name: &'static str, tag: Tag) -> Self {
        Template {
            kind: ItemKind::Primitive,
            type_name,
            primitive_tag: Some(tag),
            accepted_tags: &[],
            fields: &[],
            pre_decode: None,
            post_decode: None,
            ex_d2i: None,
            compat: None,
        }
    }

    /// Convenience constructor for the ANY wildcard.
    pub const fn any(type_name: &'static str) -> Self {
        Template {
            kind: ItemKind::Primitive,
            type_name,
            primitive_tag: None,
            accepted_tags: &[],
            fields: &[],
            pre_decode: None,
            post_decode: None,
            ex_d2i: None,
            compat: None,
        }
    }

    pub const fn sequence(type_name: &'static str, fields: &'static [FieldTemplate]) -> Self {
        Template {
            kind: ItemKind::Sequence,
            type_name,
            primitive_tag: None,
            accepted_tags: &[],
            fields,
            pre_decode: None,
            post_decode: None,
            ex_d2i: None,
            compat: None,
        }
    }

    pub const fn choice(type_name: &'static str, fields: &'static [FieldTemplate]) -> Self {
        Template {
            kind: ItemKind::Choice,
            type_name,
            primitive_tag: None,
            accepted_tags: &[],
            fields,
            pre_decode: None,
            post_decode: None,
            ex_d2i: None,
            compat: None,
        }
    }

    pub const fn mstring(type_name: &'static str, accepted_tags: &'static [Tag]) -> Self {
        Template {
            kind: ItemKind::MultiString,
            type_name,
            primitive_tag: None,
            accepted_tags,
            fields: &[],
            pre_decode: None,
            post_decode: None,
            ex_d2i: None,
            compat: None,
        }
    }
}

/// Three-valued outcome of [`decode_item`]/[`decode_template`], the safe
/// equivalent of spec §4.5's `1 | -1(absent) | 0(error)` — the error arm is
/// `Err` on the surrounding `Result` instead of a third enum variant.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeStatus {
    Present(Value),
    Absent,
}

/// C5, entry point: dispatch on `template.kind` (spec §4.5).
///
/// `optional=false` is an invariant precondition for callers that cannot
/// tolerate [`DecodeStatus::Absent`]: every kind below either returns
/// `Present` or a hard error in that case, never `Absent` — relied on by
/// [`decode_explicit`] and [`decode_collection_of`], which call back into
/// this function with `optional=false`.
pub fn decode_item(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    tag_override: Option<(i32, Class)>,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let _token = depth.enter()?;
    match template.kind {
        ItemKind::Primitive => {
            decode_primitive_item(cursor, template, tag_override, optional, cache, depth)
        }
        ItemKind::MultiString => decode_mstring(cursor, template, optional, cache, depth),
        ItemKind::Sequence => {
            decode_sequence(cursor, template, tag_override, optional, cache, depth)
        }
        ItemKind::Choice => decode_choice(cursor, template, optional, cache, depth),
        ItemKind::Extern => {
            let f = template.ex_d2i.ok_or_else(|| Error::simple(ErrorKind::AuxError))?;
            f(cursor, template, tag_override, optional, cache, depth)
        }
        ItemKind::Compat => decode_compat(cursor, template, tag_override, optional, cache, depth),
    }
}

fn decode_primitive_item(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    tag_override: Option<(i32, Class)>,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    // A Primitive template wrapping a single field is a shim: its own
    // framing (EXPLICIT/IMPLICIT/OF) lives on that field, not here.
    if let [field] = template.fields {
        return decode_template(cursor, field, optional, cache, depth);
    }

    let tag = match template.primitive_tag {
        None => {
            // ANY wildcard (spec §4.4 step 1).
            if tag_override.is_some() {
                return Err(Error::simple(ErrorKind::IllegalTaggedAny));
            }
            if optional {
                return Err(Error::simple(ErrorKind::IllegalOptionalAny));
            }
            let v = decode_any(cursor, cache, depth)?;
            return Ok(DecodeStatus::Present(v));
        }
        Some(tag) => tag,
    };

    let (expected_tag, expected_class) = tag_override.unwrap_or((tag.0 as i32, Class::Universal));
    log_trace!("decode_primitive_item: type={} expected={}", template.type_name, expected_tag);
    match read_header(cursor, expected_tag, expected_class, optional, cache)? {
        HeaderOutcome::Absent => Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => {
            // The wire tag/class may be an IMPLICIT override; the value is
            // still decoded as the template's own universal type, so
            // Class::Universal is passed here regardless of `expected_class`.
            let v = decode_primitive(cursor, tag, Class::Universal, h.length, h.constructed, cache, depth)?;
            Ok(DecodeStatus::Present(v))
        }
    }
}

/// MSTRING (spec §4.5 "MultiString").
fn decode_mstring(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    // Inspect the header without consuming it: MSTRING must see the tag
    // before it can know which accepted-tags check applies, and a consuming
    // probe would commit the cursor before that decision is made.
    let header = peek_header(cursor, cache)?;

    if !header.class.is_universal() {
        if optional {
            return Ok(DecodeStatus::Absent);
        }
        return Err(Error::simple(ErrorKind::MStringNotUniversal));
    }
    if !template.accepted_tags.contains(&header.tag) {
        if optional {
            return Ok(DecodeStatus::Absent);
        }
        return Err(Error::simple(ErrorKind::MStringWrongTag));
    }

    // Open Question (i), spec §9: the source delegates here with opt=1 even
    // though the tag is already confirmed, which duplicates the OPTIONAL
    // check just performed above. Preserved verbatim per the instruction to
    // keep source behaviour unless testing reveals divergence; see
    // DESIGN.md.
    match read_header(cursor, header.tag.0 as i32, Class::Universal, true, cache)? {
        HeaderOutcome::Absent => Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => {
            // `header.class.is_universal()` was already checked above.
            let v = decode_primitive(cursor, h.tag, Class::Universal, h.length, h.constructed, cache, depth)?;
            Ok(DecodeStatus::Present(v))
        }
    }
}

/// CHOICE (spec §4.5 "Choice").
fn decode_choice(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let mut aggregate: Option<Value> = None;
    for (index, field) in template.fields.iter().enumerate() {
        log_trace!("decode_choice: {} trying alternative {}", template.type_name, index);
        match decode_template(cursor, field, true, cache, depth)? {
            DecodeStatus::Present(value) => {
                aggregate.set_choice(index, value);
                return Ok(DecodeStatus::Present(aggregate.expect("just set by set_choice")));
            }
            DecodeStatus::Absent => continue,
        }
    }
    if optional {
        Ok(DecodeStatus::Absent)
    } else {
        Err(Error::simple(ErrorKind::NoMatchingChoice))
    }
}

fn resolve_field(field: &FieldTemplate, aggregate: &Option<Value>) -> FieldTemplate {
    match field.adb {
        Some(resolve) => {
            let template = aggregate.as_ref().map(resolve).unwrap_or(field.template);
            FieldTemplate { template, ..*field }
        }
        None => *field,
    }
}

/// SEQUENCE field loop (spec §4.5 "Sequence", steps 4 and 7), operating on
/// whatever cursor the caller has scoped to this body — a sub-cursor for a
/// definite length, or the shared cursor (terminated by EOC) for indefinite.
fn decode_fields(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    indefinite: bool,
    aggregate: &mut Option<Value>,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<bool> {
    let fields = template.fields;
    let mut terminated = false;
    let mut i = 0;
    while i < fields.len() {
        if cursor.is_empty() {
            break;
        }
        if indefinite && check_eoc(cursor) {
            terminated = true;
            break;
        }

        let effective = resolve_field(&fields[i], aggregate);
        let is_last = i + 1 == fields.len();
        let force_mandatory = is_last && !cursor.is_empty();
        let field_optional = effective.flags.contains(Flags::OPTIONAL) && !force_mandatory;

        log_trace!("decode_fields: {} field {}", template.type_name, effective.name);
        match decode_template(cursor, &effective, field_optional, cache, depth)? {
            DecodeStatus::Present(value) => {
                *aggregate.field_slot(template, effective.offset.0) = Some(value);
            }
            DecodeStatus::Absent => {
                *aggregate.field_slot(template, effective.offset.0) = None;
            }
        }
        i += 1;
    }

    // Body exhausted mid-sequence: every unreached field must be OPTIONAL
    // (spec §4.5 step 7).
    for field in &fields[i..] {
        if !field.flags.contains(Flags::OPTIONAL) {
            return Err(Error::simple(ErrorKind::FieldMissing));
        }
    }
    Ok(terminated)
}

/// SEQUENCE/SET-as-fixed-aggregate (spec §4.5 "Sequence").
fn decode_sequence(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    tag_override: Option<(i32, Class)>,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let (expected_tag, expected_class) =
        tag_override.unwrap_or((Tag::Sequence.0 as i32, Class::Universal));
    let header = match read_header(cursor, expected_tag, expected_class, optional, cache)? {
        HeaderOutcome::Absent => return Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => h,
    };
    if !header.constructed {
        return Err(Error::simple(ErrorKind::SequenceNotConstructed));
    }

    let mut aggregate = <Option<Value> as Aggregate>::new_aggregate(template);
    if let Some(pre) = template.pre_decode {
        if let Some(v) = &aggregate {
            if !pre(v) {
                return Err(Error::simple(ErrorKind::AuxError));
            }
        }
    }

    let indefinite = !header.length.is_definite();
    let terminated = if indefinite {
        decode_fields(cursor, template, true, &mut aggregate, cache, depth)?
    } else {
        let n = header.length.definite()?;
        let sub_bytes = cursor.take(n)?;
        let mut sub_cursor = Cursor::new(sub_bytes);
        let terminated = decode_fields(&mut sub_cursor, template, false, &mut aggregate, cache, depth)?;
        if !sub_cursor.is_empty() {
            return Err(Error::simple(ErrorKind::SequenceLengthMismatch));
        }
        terminated
    };

    if indefinite && !terminated && !check_eoc(cursor) {
        return Err(Error::simple(ErrorKind::MissingEOC));
    }

    if let Some(post) = template.post_decode {
        if let Some(v) = &aggregate {
            if !post(v) {
                return Err(Error::simple(ErrorKind::AuxError));
            }
        }
    }

    Ok(DecodeStatus::Present(aggregate.expect("sequence aggregate always allocated")))
}

/// Per-field framing (spec §4.5 "Template decode").
pub fn decode_template(
    cursor: &mut Cursor<'_>,
    field: &FieldTemplate,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let _token = depth.enter()?;

    if field.flags.contains(Flags::EXPLICIT) {
        return decode_explicit(cursor, field, optional, cache, depth);
    }
    if field.flags.contains(Flags::SET_OF) || field.flags.contains(Flags::SEQUENCE_OF) {
        return decode_collection_of(cursor, field, optional, cache, depth);
    }
    if field.flags.contains(Flags::IMPLICIT) {
        let tag = field
            .tag_number
            .ok_or_else(|| Error::simple(ErrorKind::BadObjectHeader))? as i32;
        return decode_item(cursor, field.template, Some((tag, field.tag_class)), optional, cache, depth);
    }
    decode_item(cursor, field.template, None, optional, cache, depth)
}

/// EXPLICIT tag wrapper (spec §4.5 "Template decode").
fn decode_explicit(
    cursor: &mut Cursor<'_>,
    field: &FieldTemplate,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let tag = field
        .tag_number
        .ok_or_else(|| Error::simple(ErrorKind::BadObjectHeader))? as i32;
    let header = match read_header(cursor, tag, field.tag_class, optional, cache)? {
        HeaderOutcome::Absent => return Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => h,
    };
    if !header.constructed {
        return Err(Error::simple(ErrorKind::ExplicitTagNotConstructed));
    }

    let status = if header.length.is_definite() {
        let n = header.length.definite()?;
        let sub_bytes = cursor.take(n)?;
        let mut sub_cursor = Cursor::new(sub_bytes);
        let status = decode_item(&mut sub_cursor, field.template, None, false, cache, depth)?;
        if !sub_cursor.is_empty() {
            return Err(Error::simple(ErrorKind::ExplicitLengthMismatch));
        }
        status
    } else {
        let status = decode_item(cursor, field.template, None, false, cache, depth)?;
        if !check_eoc(cursor) {
            return Err(Error::simple(ErrorKind::MissingEOC));
        }
        status
    };

    match status {
        DecodeStatus::Present(_) => Ok(status),
        DecodeStatus::Absent => unreachable!("decode_item with optional=false never returns Absent"),
    }
}

/// SET-OF / SEQUENCE-OF (spec §4.5 "Template decode").
fn decode_collection_of(
    cursor: &mut Cursor<'_>,
    field: &FieldTemplate,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let (expected_tag, expected_class) = if field.flags.contains(Flags::IMPLICIT) {
        let tag = field
            .tag_number
            .ok_or_else(|| Error::simple(ErrorKind::BadObjectHeader))? as i32;
        (tag, field.tag_class)
    } else if field.flags.contains(Flags::SET_OF) {
        (Tag::Set.0 as i32, Class::Universal)
    } else {
        (Tag::Sequence.0 as i32, Class::Universal)
    };

    let header = match read_header(cursor, expected_tag, expected_class, optional, cache)? {
        HeaderOutcome::Absent => return Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => h,
    };
    if !header.constructed {
        return Err(Error::simple(ErrorKind::SequenceNotConstructed));
    }

    let mut items = Vec::new();
    if header.length.is_definite() {
        let n = header.length.definite()?;
        let sub_bytes = cursor.take(n)?;
        let mut sub_cursor = Cursor::new(sub_bytes);
        while !sub_cursor.is_empty() {
            match decode_item(&mut sub_cursor, field.template, None, false, cache, depth)? {
                DecodeStatus::Present(v) => items.push(v),
                DecodeStatus::Absent => unreachable!("element decode is never optional"),
            }
        }
    } else {
        loop {
            if cursor.is_empty() {
                return Err(Error::simple(ErrorKind::MissingEOC));
            }
            if check_eoc(cursor) {
                break;
            }
            match decode_item(cursor, field.template, None, false, cache, depth)? {
                DecodeStatus::Present(v) => items.push(v),
                DecodeStatus::Absent => unreachable!("element decode is never optional"),
            }
        }
    }
    Ok(DecodeStatus::Present(Value::CollectionOf(items)))
}

/// Compat (spec §4.5 "Compat"): legacy value-codec adapter. The original
/// mutates the first input byte in place to smuggle the expected universal
/// tag past a legacy codec that reparses its own header; here `read_header`
/// already applies the tag override while consuming the header, so the
/// codec only ever sees content octets and the byte-aliasing trick is
/// unnecessary (REDESIGN FLAGS, option (b) — see DESIGN.md). The ≤30 tag
/// number ceiling is preserved for template compatibility.
fn decode_compat(
    cursor: &mut Cursor<'_>,
    template: &'static Template,
    tag_override: Option<(i32, Class)>,
    optional: bool,
    cache: &mut HeaderCache,
    depth: &DepthGuard,
) -> Result<DecodeStatus> {
    let compat = template.compat.ok_or_else(|| Error::simple(ErrorKind::AuxError))?;
    if let Some((tag, _)) = tag_override {
        if !(0..=30).contains(&tag) {
            return Err(Error::simple(ErrorKind::BadObjectHeader));
        }
    }
    let (expected_tag, expected_class) = tag_override.unwrap_or((
        template.primitive_tag.map(|t| t.0 as i32).unwrap_or(Tag::ANY),
        Class::Universal,
    ));
    match read_header(cursor, expected_tag, expected_class, optional, cache)? {
        HeaderOutcome::Absent => Ok(DecodeStatus::Absent),
        HeaderOutcome::Present(h) => {
            let bytes = read_body(cursor, h.length, h.constructed, Tag::ANY, cache, depth)?;
            Ok(DecodeStatus::Present(compat(&bytes)?))
        }
    }
}
