//! Filter for NIT script blocks of both protocol generations.

use std::sync::LazyLock;

use regex::Regex;

use crate::filter::{BlockFilter, Markers};

/// Legacy opening marker.
pub const LEGACY_START: &str = "[[[NIT_CALL]]]";
/// Legacy closing marker.
pub const LEGACY_END: &str = "[[[NIT_END]]]";

static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<nit(?:-[0-9a-f]{4})?>").expect("start tag pattern is valid")
});
static END_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</nit(?:-[0-9a-f]{4})?>").expect("end tag pattern is valid")
});

// `<nit-XXXX>` / `</nit-XXXX>`
const MAX_TAG_LEN: usize = 10;
const MAX_END_TAG_LEN: usize = 11;

/// Markers for `[[[NIT_CALL]]]` blocks and `<nit>` / `<nit-XXXX>` tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct NitMarkers;

impl Markers for NitMarkers {
    type Open = ();

    fn find_start(&self, buf: &str) -> Option<(usize, ())> {
        let legacy = buf.find(LEGACY_START);
        let tag = START_TAG.find(buf).map(|m| m.start());
        match (legacy, tag) {
            (Some(a), Some(b)) => Some((a.min(b), ())),
            (Some(a), None) | (None, Some(a)) => Some((a, ())),
            (None, None) => None,
        }
    }

    fn could_start(&self, suffix: &str) -> bool {
        LEGACY_START.starts_with(suffix) || could_start_tag(suffix)
    }

    fn max_start_len(&self) -> usize {
        LEGACY_START.len().max(MAX_TAG_LEN)
    }

    fn find_end(&self, (): &(), buf: &str) -> Option<usize> {
        let legacy = buf.find(LEGACY_END).map(|i| (i, i + LEGACY_END.len()));
        let tag = END_TAG.find(buf).map(|m| (m.start(), m.end()));
        match (legacy, tag) {
            (Some(a), Some(b)) => Some(if a.0 < b.0 { a.1 } else { b.1 }),
            (Some((_, end)), None) | (None, Some((_, end))) => Some(end),
            (None, None) => None,
        }
    }

    fn max_end_len(&self) -> usize {
        LEGACY_END.len().max(MAX_END_TAG_LEN)
    }
}

/// Whether `suffix` is a proper prefix of some `<nit>` / `<nit-XXXX>` tag.
fn could_start_tag(suffix: &str) -> bool {
    let bytes = suffix.as_bytes();
    let head = b"<nit";
    let shared = bytes.len().min(head.len());
    if !bytes[..shared].eq_ignore_ascii_case(&head[..shared]) {
        return false;
    }
    match bytes.get(head.len()..) {
        None | Some([]) => true,
        Some([b'-', id @ ..]) => id.len() <= 4 && id.iter().all(u8::is_ascii_hexdigit),
        Some(_) => false,
    }
}

/// Hides NIT script blocks from streamed output.
pub type NitStreamFilter = BlockFilter<NitMarkers>;

impl NitStreamFilter {
    /// Creates a filter for both protocol generations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_markers(NitMarkers)
    }
}

impl Default for NitStreamFilter {
    fn default() -> Self {
        Self::new()
    }
}
