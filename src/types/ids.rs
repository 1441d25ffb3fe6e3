//! Newtype wrappers for domain identifiers.
//!
//! Call identifiers are assigned by the calling platform and are opaque to us.
//! Wrapping them keeps them from being confused with phone numbers, tool call
//! ids, or other strings that flow through the same payloads.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Prefix for contact reference codes handed back to callers.
const REFERENCE_PREFIX: &str = "QL-";

/// Number of hex characters of the digest kept in a reference code.
const REFERENCE_HEX_LEN: usize = 8;

/// The platform-assigned identifier of a single phone call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl CallId {
    pub fn new(s: impl Into<String>) -> Self {
        CallId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the short contact reference code for this call.
    ///
    /// The code is stable for a given call id, so a retried `create_contact`
    /// invocation hands the caller the same reference.
    pub fn reference_code(&self) -> String {
        reference_code(self.as_str())
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        CallId(s)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        CallId(s.to_string())
    }
}

/// Builds a reference code (`QL-` plus eight uppercase hex digits) from a seed.
pub fn reference_code(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let hex = hex::encode_upper(digest);
    format!("{REFERENCE_PREFIX}{}", &hex[..REFERENCE_HEX_LEN])
}
