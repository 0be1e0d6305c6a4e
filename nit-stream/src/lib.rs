//! Streaming filters that keep NIT script blocks, side-channel tags, and
//! thinking asides out of text shown to users.
//!
//! Each filter consumes chunks as they arrive and returns only text that can
//! no longer turn out to be part of a hidden block.
//!
//! ```
//! use nit_stream::{NitStreamFilter, StreamFilter};
//!
//! let mut filter = NitStreamFilter::new();
//! let mut shown = filter.filter("hello <ni");
//! shown += &filter.filter("t-1A2B>secret</nit-1A2B> world");
//! shown += &filter.flush();
//! assert_eq!(shown, "hello  world");
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub mod filter;
pub mod nit;
mod strip;
pub mod thinking;
pub mod xml;

pub use filter::{BlockFilter, Markers, StreamFilter, run_filter};
pub use nit::{LEGACY_END, LEGACY_START, NitMarkers, NitStreamFilter};
pub use strip::strip_blocks;
pub use thinking::{ThinkingMarkers, ThinkingStreamFilter};
pub use xml::{DEFAULT_HIDDEN_TAGS, XmlMarkers, XmlStreamFilter};
