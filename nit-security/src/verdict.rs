//! Per-block security verdicts.

use nit_primitives::NitId;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::handshake::{SecurityManager, Validation};

/// How untagged `<nit>` blocks are treated while a NIT-ID is expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// Run untagged blocks, logging each as a fallback.
    #[default]
    AllowFallback,
    /// Refuse untagged blocks.
    Strict,
}

/// Decision for one script block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum BlockVerdict {
    /// Run the block.
    Allow,
    /// Run an untagged block under [`TagPolicy::AllowFallback`].
    Fallback,
    /// Refuse the block.
    Block {
        /// Message reported in place of the block's output.
        reason: String,
    },
}

impl BlockVerdict {
    /// Returns true unless the block is refused.
    #[must_use]
    pub fn permits_execution(&self) -> bool {
        !matches!(self, Self::Block { .. })
    }
}

/// Decides whether a block tagged with `extracted_id` may run.
///
/// With no expected identifier every block runs.
#[must_use]
pub fn verdict(
    extracted_id: Option<&str>,
    expected: Option<&NitId>,
    policy: TagPolicy,
) -> BlockVerdict {
    let Some(expected) = expected else {
        return BlockVerdict::Allow;
    };

    match (SecurityManager::validate(extracted_id, expected.as_str()), policy) {
        (Validation::Valid, _) => BlockVerdict::Allow,
        (Validation::Invalid, _) => {
            let reason = format!(
                "security block: NIT ID mismatch (expected {expected}, got {})",
                extracted_id.unwrap_or_default().trim()
            );
            warn!(%expected, got = extracted_id.unwrap_or_default(), "NIT block refused");
            BlockVerdict::Block { reason }
        }
        (Validation::Missing, TagPolicy::AllowFallback) => {
            warn!(%expected, "untagged <nit> block accepted as fallback");
            BlockVerdict::Fallback
        }
        (Validation::Missing, TagPolicy::Strict) => {
            warn!(%expected, "untagged <nit> block refused");
            BlockVerdict::Block {
                reason: format!(
                    "security block: untagged <nit> block while {} is required",
                    expected.open_tag()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> NitId {
        NitId::new("A9B2").unwrap()
    }

    #[test]
    fn no_expectation_allows_everything() {
        assert_eq!(verdict(Some("9999"), None, TagPolicy::Strict), BlockVerdict::Allow);
        assert_eq!(verdict(None, None, TagPolicy::Strict), BlockVerdict::Allow);
    }

    #[test]
    fn mismatch_blocks_with_reason() {
        let BlockVerdict::Block { reason } =
            verdict(Some("9999"), Some(&expected()), TagPolicy::AllowFallback)
        else {
            panic!("expected block");
        };
        assert!(reason.contains("A9B2"));
        assert!(reason.contains("9999"));
    }

    #[test]
    fn untagged_blocks_follow_policy() {
        let id = expected();
        assert_eq!(
            verdict(None, Some(&id), TagPolicy::AllowFallback),
            BlockVerdict::Fallback
        );
        assert!(!verdict(None, Some(&id), TagPolicy::Strict).permits_execution());
        assert!(verdict(Some("a9b2"), Some(&id), TagPolicy::Strict).permits_execution());
    }
}
