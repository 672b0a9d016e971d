#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Template-driven decoder for ASN.1 data encoded in BER (a superset of DER).
//!
//! The decoder walks a caller-supplied [`Template`] — an ordinary, typically
//! `'static`, data structure describing some ASN.1 type — against a byte
//! buffer, and produces a [`Value`] tree or a precise [`Error`]. There is no
//! macro-generated code path: templates are plain values, built by hand the
//! same way a derive macro (not part of this crate; see `DESIGN.md`) would
//! build them.

extern crate alloc;

mod cache;
mod codec;
mod collector;
mod cursor;
mod datetime;
mod debug;
mod decode;
mod depth;
mod error;
mod header;
mod length;
mod primitive;
mod tag;
mod template;
mod value;

pub use cache::HeaderCache;
pub use codec::{AsnString, ValueCodec};
pub use collector::Collector;
pub use cursor::Cursor;
pub use datetime::{Asn1DateTime, Asn1TimeZone};
pub use decode::{decode, decode_with_options, decode_with_slot, DecodeOptions};
pub use error::{Diagnostic, Error, ErrorKind, Result};
pub use header::{check_eoc, read_header, HeaderOutcome};
pub use length::Length;
pub use primitive::decode_primitive;
pub use tag::{Class, Tag};
pub use template::{
    decode_item, decode_template, ChoiceField, DecodeStatus, FieldOffset, FieldTemplate, Flags,
    ItemKind, Template,
};
pub use value::{Aggregate, Value};
