//! Structured records of tool invocations.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Character budget for parameter previews.
pub const PARAMS_PREVIEW_LEN: usize = 200;

/// Character budget for result previews.
pub const RESULT_PREVIEW_LEN: usize = 100;

/// Truncates `text` to `max` characters, appending `...` when cut.
#[must_use]
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The tool returned a value.
    Success,
    /// The tool could not be resolved or failed.
    Failure {
        /// Rendered error.
        error: String,
    },
}

/// Timing and previews for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Tool name as requested.
    pub tool: String,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end.
    pub finished_at: DateTime<Utc>,
    /// Elapsed milliseconds, measured monotonically.
    pub duration_ms: f64,
    /// Truncated JSON parameters.
    pub params_preview: String,
    /// Truncated result, empty on failure.
    pub result_preview: String,
    /// Outcome.
    #[serde(flatten)]
    pub outcome: InvocationOutcome,
}

impl InvocationRecord {
    /// Starts timing an invocation.
    #[must_use]
    pub fn begin(tool: impl Into<String>, params: &str) -> PendingInvocation {
        PendingInvocation {
            tool: tool.into(),
            started_at: Utc::now(),
            clock: Instant::now(),
            params_preview: preview(params, PARAMS_PREVIEW_LEN),
        }
    }

    /// Whether the invocation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == InvocationOutcome::Success
    }
}

/// Invocation in progress; finish it to obtain an [`InvocationRecord`].
#[derive(Debug)]
pub struct PendingInvocation {
    tool: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    params_preview: String,
}

impl PendingInvocation {
    /// Tool name being timed.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Truncated parameters.
    #[must_use]
    pub fn params_preview(&self) -> &str {
        &self.params_preview
    }

    /// Milliseconds elapsed so far.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    /// Completes the record with a successful result.
    #[must_use]
    pub fn succeed(self, result: &str) -> InvocationRecord {
        let result_preview = preview(result, RESULT_PREVIEW_LEN);
        self.finish(InvocationOutcome::Success, result_preview)
    }

    /// Completes the record with an error.
    #[must_use]
    pub fn fail(self, error: impl Into<String>) -> InvocationRecord {
        self.finish(
            InvocationOutcome::Failure {
                error: error.into(),
            },
            String::new(),
        )
    }

    fn finish(self, outcome: InvocationOutcome, result_preview: String) -> InvocationRecord {
        let duration_ms = self.elapsed_ms();
        InvocationRecord {
            tool: self.tool,
            started_at: self.started_at,
            finished_at: Utc::now(),
            duration_ms,
            params_preview: self.params_preview,
            result_preview,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_characters() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn records_carry_previews_and_outcome() {
        let long = "x".repeat(500);
        let record = InvocationRecord::begin("search", &long).succeed(&long);

        assert_eq!(record.params_preview.chars().count(), PARAMS_PREVIEW_LEN + 3);
        assert_eq!(record.result_preview.chars().count(), RESULT_PREVIEW_LEN + 3);
        assert!(record.is_success());
        assert!(record.finished_at >= record.started_at);
        assert!(record.duration_ms >= 0.0);
    }

    #[test]
    fn failures_serialize_with_error() {
        let record = InvocationRecord::begin("boom", "{}").fail("exploded");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["error"], "exploded");
        assert!(!record.is_success());
    }
}
