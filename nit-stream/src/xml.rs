//! Filter for XML-style side-channel tags such as `<PEROCUE>`.

use crate::filter::{BlockFilter, Markers};

/// Tags hidden when no list is given.
pub const DEFAULT_HIDDEN_TAGS: [&str; 2] = ["PEROCUE", "CHARACTER_STATUS"];

/// Case-insensitive `<TAG>` ... `</TAG>` markers for a fixed set of tags.
#[derive(Debug, Clone)]
pub struct XmlMarkers {
    tags: Vec<String>,
}

impl XmlMarkers {
    /// Creates markers for `tags`, compared in upper case.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_ascii_uppercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        Self { tags }
    }

    /// Tags being hidden, upper-cased.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Default for XmlMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_HIDDEN_TAGS)
    }
}

impl Markers for XmlMarkers {
    /// Closing tag, upper-cased.
    type Open = String;

    fn find_start(&self, buf: &str) -> Option<(usize, String)> {
        let upper = buf.to_ascii_uppercase();
        self.tags
            .iter()
            .filter_map(|tag| upper.find(&format!("<{tag}>")).map(|at| (at, tag)))
            .min_by_key(|(at, _)| *at)
            .map(|(at, tag)| (at, format!("</{tag}>")))
    }

    fn could_start(&self, suffix: &str) -> bool {
        let upper = suffix.to_ascii_uppercase();
        self.tags
            .iter()
            .any(|tag| format!("<{tag}>").starts_with(&upper))
    }

    fn max_start_len(&self) -> usize {
        self.tags.iter().map(|tag| tag.len() + 2).max().unwrap_or(0)
    }

    fn find_end(&self, close: &String, buf: &str) -> Option<usize> {
        buf.to_ascii_uppercase()
            .find(close.as_str())
            .map(|at| at + close.len())
    }

    fn max_end_len(&self) -> usize {
        self.tags.iter().map(|tag| tag.len() + 3).max().unwrap_or(0)
    }
}

/// Hides XML-style tag blocks from streamed output.
pub type XmlStreamFilter = BlockFilter<XmlMarkers>;

impl XmlStreamFilter {
    /// Creates a filter hiding `tags`.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_markers(XmlMarkers::new(tags))
    }
}

impl Default for XmlStreamFilter {
    fn default() -> Self {
        Self::with_markers(XmlMarkers::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{StreamFilter, run_filter};

    #[test]
    fn hides_default_tags_in_any_case() {
        let mut filter = XmlStreamFilter::default();
        let shown = run_filter(
            &mut filter,
            ["Hi <pero", "cue>{\"mood\":1}</PERO", "CUE> there <Character_Status>x</character_status>."],
        );
        assert_eq!(shown, "Hi  there .");
    }

    #[test]
    fn block_closes_only_on_its_own_tag() {
        let mut filter = XmlStreamFilter::new(["a", "b"]);
        let shown = run_filter(&mut filter, ["1<A>2</B>3</A>4<b>5</b>6"]);
        assert_eq!(shown, "146");
    }

    #[test]
    fn unrelated_angle_brackets_pass_through() {
        let mut filter = XmlStreamFilter::default();
        assert_eq!(filter.filter("a < b and <em>c</em>"), "a < b and <em>c</em>");
        assert_eq!(filter.filter(" then <"), " then ");
        assert_eq!(filter.flush(), "<");
    }

    #[test]
    fn empty_tag_list_hides_nothing() {
        let mut filter = XmlStreamFilter::new(Vec::<String>::new());
        assert_eq!(filter.filter("<PEROCUE>x</PEROCUE>"), "<PEROCUE>x</PEROCUE>");
    }
}
