//! Provider-defined identifiers

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque name of a routing domain.
///
/// Any string is a syntactically valid PID; whether it exists is a question
/// for the [`crate::NetworkMap`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(String);

impl Pid {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse a PID from a request. Never fails.
pub fn parse_pid(name: &str) -> Pid {
    Pid::new(name)
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Pid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Pid {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
