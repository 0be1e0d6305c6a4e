//! Incremental block hiding shared by every stream filter.

use tracing::trace;

/// Incremental filter over streamed text.
pub trait StreamFilter: Send {
    /// Consumes a chunk and returns the text that is safe to show.
    fn filter(&mut self, chunk: &str) -> String;

    /// Ends the stream, returning held-back text unless a block is still
    /// open. The filter is reset afterwards.
    fn flush(&mut self) -> String;
}

/// Start and end markers of one family of hidden blocks.
pub trait Markers: Send {
    /// State carried while inside a block, typically the expected closer.
    type Open: Send;

    /// Earliest block start in `buf`: its byte offset and the open state.
    fn find_start(&self, buf: &str) -> Option<(usize, Self::Open)>;

    /// Whether `suffix` could be the beginning of a start marker.
    fn could_start(&self, suffix: &str) -> bool;

    /// Byte length of the longest start marker.
    fn max_start_len(&self) -> usize;

    /// Byte offset just past the end marker, if `buf` contains it.
    fn find_end(&self, open: &Self::Open, buf: &str) -> Option<usize>;

    /// Byte length of the longest end marker.
    fn max_end_len(&self) -> usize;
}

/// [`StreamFilter`] driven by a [`Markers`] implementation.
///
/// Outside a block everything before the earliest start marker is emitted
/// immediately; only a trailing fragment that could still grow into a start
/// marker is held back. Inside a block nothing is emitted and the buffer is
/// cut down to the tail that might hold a split end marker.
pub struct BlockFilter<M: Markers> {
    markers: M,
    buffer: String,
    open: Option<M::Open>,
}

impl<M: Markers + std::fmt::Debug> std::fmt::Debug for BlockFilter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockFilter")
            .field("markers", &self.markers)
            .field("buffered", &self.buffer.len())
            .field("in_block", &self.in_block())
            .finish()
    }
}

impl<M: Markers> BlockFilter<M> {
    /// Wraps a marker family.
    #[must_use]
    pub fn with_markers(markers: M) -> Self {
        Self {
            markers,
            buffer: String::new(),
            open: None,
        }
    }

    /// Whether a block is currently open.
    #[must_use]
    pub fn in_block(&self) -> bool {
        self.open.is_some()
    }

    /// Marker family in use.
    #[must_use]
    pub fn markers(&self) -> &M {
        &self.markers
    }

    fn held_back_len(&self) -> usize {
        let len = self.buffer.len();
        let window = self.markers.max_start_len().min(len);
        self.buffer
            .char_indices()
            .map(|(i, _)| i)
            .filter(|&i| i >= len - window)
            .find(|&i| self.markers.could_start(&self.buffer[i..]))
            .map_or(0, |i| len - i)
    }

    fn trim_block_tail(&mut self) {
        let keep = self.markers.max_end_len().saturating_sub(1);
        if self.buffer.len() <= keep {
            return;
        }
        let mut cut = self.buffer.len() - keep;
        while !self.buffer.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buffer.drain(..cut);
    }
}

impl<M: Markers> StreamFilter for BlockFilter<M> {
    fn filter(&mut self, chunk: &str) -> String {
        self.buffer.push_str(chunk);
        let mut output = String::new();

        loop {
            if let Some(open) = &self.open {
                let Some(end) = self.markers.find_end(open, &self.buffer) else {
                    self.trim_block_tail();
                    return output;
                };
                self.buffer.drain(..end);
                self.open = None;
                trace!("hidden block closed");
                continue;
            }

            if let Some((start, open)) = self.markers.find_start(&self.buffer) {
                output.push_str(&self.buffer[..start]);
                self.buffer.drain(..start);
                self.open = Some(open);
                trace!("hidden block opened");
                continue;
            }

            let emit = self.buffer.len() - self.held_back_len();
            output.push_str(&self.buffer[..emit]);
            self.buffer.drain(..emit);
            return output;
        }
    }

    fn flush(&mut self) -> String {
        let rest = std::mem::take(&mut self.buffer);
        if self.open.take().is_some() {
            String::new()
        } else {
            rest
        }
    }
}

/// Runs `filter` over `chunks` and flushes, returning everything emitted.
pub fn run_filter<F, I, S>(filter: &mut F, chunks: I) -> String
where
    F: StreamFilter + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut output: String = chunks
        .into_iter()
        .map(|chunk| filter.filter(chunk.as_ref()))
        .collect();
    output.push_str(&filter.flush());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NitStreamFilter, ThinkingStreamFilter, XmlStreamFilter};

    fn cut_points(text: &str) -> Vec<usize> {
        (0..=text.len()).filter(|&i| text.is_char_boundary(i)).collect()
    }

    fn assert_same_for_every_split<F, N>(new: N, text: &str, expected: &str)
    where
        F: StreamFilter,
        N: Fn() -> F,
    {
        assert_eq!(run_filter(&mut new(), [text]), expected);
        assert_eq!(run_filter(&mut new(), text.chars().map(String::from)), expected);

        let cuts = cut_points(text);
        for &i in &cuts {
            let shown = run_filter(&mut new(), [&text[..i], &text[i..]]);
            assert_eq!(shown, expected, "split at byte {i}");
        }
        for (n, &i) in cuts.iter().enumerate() {
            for &j in &cuts[n..] {
                let shown = run_filter(&mut new(), [&text[..i], &text[i..j], &text[j..]]);
                assert_eq!(shown, expected, "split at bytes {i} and {j}");
            }
        }
    }

    #[test]
    fn nit_output_ignores_chunk_boundaries() {
        assert_same_for_every_split(
            NitStreamFilter::new,
            "ü <nit-A9B2>$x = a(b=\"é\")</nit-A9B2> mid [[[NIT_CALL]]]old()[[[NIT_END]]] \
             <nix> <nit-zz> end <nit>open",
            "ü  mid  <nix> <nit-zz> end ",
        );
    }

    #[test]
    fn xml_output_ignores_chunk_boundaries() {
        assert_same_for_every_split(
            XmlStreamFilter::default,
            "Hi <perocue>{\"mood\":\"ü\"}</PEROCUE> there \
             <CHARACTER_STATUS>x</perocue>y</character_status>! <per",
            "Hi  there ! <per",
        );
    }

    #[test]
    fn thinking_output_ignores_chunk_boundaries() {
        assert_same_for_every_split(
            ThinkingStreamFilter::new,
            "ok 【Thinking about it】 then [monologue: hmm] and (THINKING) [plain] (x) done",
            "ok  then  and  [plain] (x) done",
        );
    }
}
