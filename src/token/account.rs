//! Account identifiers and time values used throughout the ledger

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in whole seconds
pub type Timestamp = u64;

/// Canonical form of the null account
const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Opaque, address-like account identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null account. Tokens can never be sent here.
    pub fn null() -> Self {
        Self(NULL_ADDRESS.to_string())
    }

    /// True for the empty id and for `0x` followed only by zeros
    pub fn is_null(&self) -> bool {
        let id = self.0.trim();
        if id.is_empty() {
            return true;
        }
        match id.strip_prefix("0x").or_else(|| id.strip_prefix("0X")) {
            Some(rest) => rest.chars().all(|c| c == '0'),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
