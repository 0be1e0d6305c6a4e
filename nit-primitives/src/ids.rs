//! NIT handshake identifier.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

const NIT_ID_LEN: usize = 4;

/// Four uppercase hexadecimal characters identifying the current turn.
///
/// The identifier is ephemeral: it is recomputed for every turn and compared,
/// never persisted.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NitId(String);

impl NitId {
    /// Parses an identifier, accepting any case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNitId`] when the trimmed value is not exactly
    /// four ASCII hexadecimal characters.
    pub fn new(id: impl AsRef<str>) -> crate::Result<Self> {
        let raw = id.as_ref();
        let trimmed = raw.trim();
        if trimmed.len() != NIT_ID_LEN {
            return Err(Error::InvalidNitId {
                id: raw.to_owned(),
                reason: format!("expected {NIT_ID_LEN} characters"),
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidNitId {
                id: raw.to_owned(),
                reason: "identifier must be hexadecimal".into(),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Builds the identifier spelling `value` as four hexadecimal digits.
    #[must_use]
    pub fn from_bits(value: u16) -> Self {
        Self(format!("{value:04X}"))
    }

    /// Returns the identifier as an uppercase string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the opening tag this identifier authorizes, e.g. `<nit-A9B2>`.
    #[must_use]
    pub fn open_tag(&self) -> String {
        format!("<nit-{}>", self.0)
    }

    /// Returns the matching closing tag, e.g. `</nit-A9B2>`.
    #[must_use]
    pub fn close_tag(&self) -> String {
        format!("</nit-{}>", self.0)
    }
}

impl Display for NitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NitId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NitId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NitId> for String {
    fn from(value: NitId) -> Self {
        value.0
    }
}
