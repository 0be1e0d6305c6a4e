//! Removal of finished script blocks from complete replies.

use std::sync::LazyLock;

use nit_script::find_blocks;
use regex::Regex;

static LEGACY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[\[\[NIT_CALL\]\]\].*?\[\[\[NIT_END\]\]\]")
        .expect("legacy block pattern is valid")
});

/// Removes every complete script block from `text` and trims the result.
///
/// Covers `[[[NIT_CALL]]]` ... `[[[NIT_END]]]` as well as `<nit>` and
/// `<nit-XXXX>` blocks. Unclosed openings are left in place.
#[must_use]
pub fn strip_blocks(text: &str) -> String {
    let without_legacy = LEGACY_BLOCK.replace_all(text, "");
    let mut out = without_legacy.into_owned();
    for block in find_blocks(&out).into_iter().rev() {
        out.replace_range(block.range, "");
    }
    out.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_both_generations() {
        let text = "  Sure. [[[NIT_CALL]]]\nold()\n[[[NIT_END]]]<nit-ab12>$x = a()</NIT-AB12> Done.<nit>b()</nit>\n";
        assert_eq!(strip_blocks(text), "Sure.  Done.");
    }

    #[test]
    fn unclosed_block_is_kept() {
        assert_eq!(strip_blocks("x <nit>oops"), "x <nit>oops");
    }
}
