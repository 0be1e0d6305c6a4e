//! Locating `<nit>` script blocks inside model output.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(nit(?:-([0-9a-f]{4}))?)>").expect("open tag pattern is valid")
});

/// A complete script block found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    /// Full block text including both tags.
    pub raw: String,
    /// Tag name as written, such as `nit` or `NIT-1a2B`.
    pub tag: String,
    /// Upper-cased identifier for `<nit-XXXX>` blocks.
    pub nit_id: Option<String>,
    /// Text between the tags.
    pub body: String,
    /// Byte range of `raw` within the searched text.
    pub range: Range<usize>,
}

impl ScriptBlock {
    /// Whether the block used the bare `<nit>` tag.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.nit_id.is_none()
    }
}

/// Finds every complete block in `text`, in order of appearance.
///
/// A block closes at the first matching `</tag>` (case-insensitive) after its
/// opening tag. Openings without a matching close are skipped.
#[must_use]
pub fn find_blocks(text: &str) -> Vec<ScriptBlock> {
    let lowered = text.to_ascii_lowercase();
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(captures) = OPEN_TAG.captures_at(text, cursor) {
        let (Some(open), Some(tag)) = (captures.get(0), captures.get(1)) else {
            break;
        };
        let close = format!("</{}>", tag.as_str().to_ascii_lowercase());

        let Some(offset) = lowered[open.end()..].find(&close) else {
            cursor = open.end();
            continue;
        };
        let body_end = open.end() + offset;
        let end = body_end + close.len();

        blocks.push(ScriptBlock {
            raw: text[open.start()..end].to_owned(),
            tag: tag.as_str().to_owned(),
            nit_id: captures.get(2).map(|id| id.as_str().to_ascii_uppercase()),
            body: text[open.end()..body_end].to_owned(),
            range: open.start()..end,
        });
        cursor = end;
    }

    blocks
}
