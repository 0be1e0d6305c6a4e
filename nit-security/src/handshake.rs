//! Per-turn NIT-ID handshake.
//!
//! Each turn the host derives a short identifier from the session and the
//! turn index and tells the model to wrap scripts in `<nit-XXXX>` tags. Blocks
//! carrying any other identifier were not produced for this turn, whether
//! replayed from history or injected through retrieved content, and are
//! refused. Identifiers are recomputed on demand and never stored.

use hmac::{Hmac, Mac};
use nit_primitives::NitId;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{SecurityError, SecurityResult};
use crate::verdict::TagPolicy;

type HmacSha256 = Hmac<Sha256>;

/// Salt used when no deployment-specific salt is configured.
pub const DEFAULT_SYSTEM_SALT: &str = "PERO_CORE_NIT_PROTOCOL_V2_SALT_2026";

/// Outcome of comparing a supplied identifier with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    /// Identifiers match.
    Valid,
    /// An identifier was supplied but differs.
    Invalid,
    /// No identifier was supplied.
    Missing,
}

impl Validation {
    /// Returns true for [`Validation::Valid`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

/// Derives and checks NIT-IDs.
#[derive(Debug, Clone)]
pub struct SecurityManager {
    salt: String,
}

impl Default for SecurityManager {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_SALT)
    }
}

impl SecurityManager {
    /// Creates a manager using `salt` as the HMAC key for session secrets.
    #[must_use]
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// `HMAC-SHA256(salt, session_id)`.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Key`] if the MAC rejects the key.
    pub fn derive_session_secret(&self, session_id: &str) -> SecurityResult<Vec<u8>> {
        hmac_sha256(self.salt.as_bytes(), session_id.as_bytes())
    }

    /// First four upper-case hex characters of
    /// `HMAC-SHA256(session_secret, turn_index)`.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Key`] if the MAC rejects the key.
    pub fn generate_id(&self, session_id: &str, turn_index: u64) -> SecurityResult<NitId> {
        let secret = self.derive_session_secret(session_id)?;
        let digest = hmac_sha256(&secret, turn_index.to_string().as_bytes())?;
        Ok(NitId::new(hex::encode_upper(&digest[..2]))?)
    }

    /// Compares identifiers after trimming, ignoring ASCII case.
    #[must_use]
    pub fn validate(input: Option<&str>, expected: &str) -> Validation {
        let input = input.map(str::trim).unwrap_or_default();
        if input.is_empty() {
            Validation::Missing
        } else if input.eq_ignore_ascii_case(expected.trim()) {
            Validation::Valid
        } else {
            Validation::Invalid
        }
    }

    /// Random identifier for request contexts without a session.
    #[must_use]
    pub fn generate_random_id() -> NitId {
        NitId::from_bits(rand::random())
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> SecurityResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|err| SecurityError::Key {
        reason: err.to_string(),
    })?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Instructions injected into the system prompt for the current turn.
#[must_use]
pub fn handshake_prompt(nit_id: &NitId, policy: TagPolicy) -> String {
    let mut prompt = format!(
        "\n[NIT SECURITY PROTOCOL]\n\
         Current Session ID: {id}\n\
         IMPORTANT: For this turn, you MUST wrap all NIT scripts in {open}...{close} tags.\n\
         Legacy NIT 1.0 format ([[[NIT_CALL]]]) and standard <nit> tags are currently DISABLED.\n",
        id = nit_id,
        open = nit_id.open_tag(),
        close = nit_id.close_tag(),
    );
    if policy == TagPolicy::Strict {
        prompt.push_str("Blocks without the session tag will be rejected.\n");
    }
    prompt
}
