// src/app/identity.rs

//! Identity keys for application records
//!
//! Two records with equal keys describe the same logical application and
//! must never coexist in a registry. Related applications use a separate
//! composite key so that the same id shipped by two different sources can
//! both be listed.

use super::App;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used in a related key when the other record has no source
pub const NO_SOURCE: &str = "(null)";

/// Canonical identity of one logical application
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    id: String,
    source: Option<String>,
}

impl IdentityKey {
    /// Key for an application id, e.g. "gimp.desktop"
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: None,
        }
    }

    /// Key for an id that is only unique together with its source,
    /// as used for history entries
    pub fn with_source(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: Some(source.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}@{}", self.id, source),
            None => write!(f, "{}", self.id),
        }
    }
}

/// De-duplication key for related applications: the other record's full id
/// plus its default source name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelatedKey {
    id: String,
    source: String,
}

impl RelatedKey {
    pub fn new(id: impl Into<String>, source: Option<&str>) -> Self {
        Self {
            id: id.into(),
            source: source.unwrap_or(NO_SOURCE).to_string(),
        }
    }

    /// Build the key for `other` as seen from the record it is related to
    pub fn of(other: &App) -> Self {
        Self::new(other.id(), other.source_default())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for RelatedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id, self.source)
    }
}
