//! Filter for bracketed thinking and monologue asides.

use std::sync::LazyLock;

use regex::Regex;

use crate::filter::{BlockFilter, Markers};

static START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:【|\[|\()(?:thinking|monologue)").expect("thinking pattern is valid")
});

const WORDS: [&str; 2] = ["thinking", "monologue"];

/// Markers for `【Thinking`, `[Monologue`, `(thinking` and similar openers,
/// each closed by the bracket matching its opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThinkingMarkers;

fn closer_for(opener: char) -> char {
    match opener {
        '【' => '】',
        '[' => ']',
        _ => ')',
    }
}

impl Markers for ThinkingMarkers {
    type Open = char;

    fn find_start(&self, buf: &str) -> Option<(usize, char)> {
        let found = START.find(buf)?;
        let opener = found.as_str().chars().next()?;
        Some((found.start(), closer_for(opener)))
    }

    fn could_start(&self, suffix: &str) -> bool {
        let mut chars = suffix.chars();
        let Some(opener) = chars.next() else {
            return false;
        };
        if !matches!(opener, '【' | '[' | '(') {
            return false;
        }
        let rest = chars.as_str().to_ascii_lowercase();
        WORDS.iter().any(|word| word.starts_with(&rest))
    }

    fn max_start_len(&self) -> usize {
        '【'.len_utf8() + WORDS.iter().map(|w| w.len()).max().unwrap_or(0)
    }

    fn find_end(&self, closer: &char, buf: &str) -> Option<usize> {
        buf.find(*closer).map(|at| at + closer.len_utf8())
    }

    fn max_end_len(&self) -> usize {
        1
    }
}

/// Hides thinking asides from streamed output.
pub type ThinkingStreamFilter = BlockFilter<ThinkingMarkers>;

impl ThinkingStreamFilter {
    /// Creates a thinking filter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_markers(ThinkingMarkers)
    }
}

impl Default for ThinkingStreamFilter {
    fn default() -> Self {
        Self::new()
    }
}
