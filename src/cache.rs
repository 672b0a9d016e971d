use crate::length::Length;
use crate::tag::{Class, Tag};

/// The decoded shape of one TLV header, as memoised by [`HeaderCache`].
#[derive(Debug, Clone, Copy)]
pub struct CachedHeader {
    pub tag: Tag,
    pub class: Class,
    pub constructed: bool,
    pub length: Length,
    /// Number of raw header octets (tag + length octets), so a consumer that
    /// decides to actually take this header knows how far to advance the
    /// cursor.
    pub header_len: usize,
}

/// One-slot memo of the most recently parsed TLV header at the current
/// cursor position (spec §3, §4.2 — component C2).
///
/// Invariants (spec §3, restated):
/// - while `valid`, the entry describes the header at the cursor's *current*
///   position;
/// - any cursor advance invalidates it;
/// - a successful tag-match consumes (invalidates) it;
/// - a tag mismatch on an OPTIONAL probe leaves it valid for the next probe.
#[derive(Debug, Default)]
pub struct HeaderCache {
    entry: Option<CachedHeader>,
}

impl HeaderCache {
    pub const fn new() -> Self {
        HeaderCache { entry: None }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    #[inline]
    pub fn get(&self) -> Option<&CachedHeader> {
        self.entry.as_ref()
    }

    #[inline]
    pub fn store(&mut self, header: CachedHeader) {
        self.entry = Some(header);
    }

    /// Any cursor-advancing success clears the cache (spec §4.2, invariant ii).
    #[inline]
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
