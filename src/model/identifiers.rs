//! Identifier newtypes with smart constructors.
//!
//! String identifiers validate non-empty input at construction time.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error for an empty identifier string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} identifier must not be empty")]
pub struct EmptyIdentifier {
    /// Which identifier kind was rejected.
    pub kind: &'static str,
}

/// Opaque handle of a tracked UI element (or the board).
///
/// The host owns the element itself; the core only ever holds this handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Smart constructor: validates non-empty id.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyIdentifier> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(EmptyIdentifier { kind: "element" });
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group shared by elements that must stay adjacent after repositioning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    /// Smart constructor: validates non-empty id.
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyIdentifier> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(EmptyIdentifier { kind: "group" });
        }
        Ok(Self(raw))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle of a live scroll container. Never reused within one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scroll-{}", self.0)
    }
}
