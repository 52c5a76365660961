// src/app/history.rs

//! Package history timeline entries

use super::identity::IdentityKey;
use super::state::{self, AppState};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One event in the install/remove/update timeline of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: IdentityKey,
    /// State the event left the package in
    pub state: AppState,
    /// Seconds since the epoch, with install-date semantics
    pub timestamp: u64,
    pub version: Option<String>,
}

impl HistoryEntry {
    /// Create a new HistoryEntry
    ///
    /// The state must be reachable from `AppState::Unknown`, as it would be
    /// for a freshly created record.
    pub fn new(key: IdentityKey, state: AppState, timestamp: u64) -> Result<Self> {
        if state != AppState::Unknown && !state::can_transition(AppState::Unknown, state) {
            return Err(Error::IllegalStateTransition {
                id: key.id().to_string(),
                from: AppState::Unknown,
                to: state,
            });
        }

        Ok(Self {
            key,
            state,
            timestamp,
            version: None,
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entry_states() {
        let key = IdentityKey::with_source("gimp.desktop", "gimp");
        let entry = HistoryEntry::new(key.clone(), AppState::Updatable, 1_400_000_000)
            .unwrap()
            .with_version("2.8.10");
        assert_eq!(entry.state, AppState::Updatable);
        assert_eq!(entry.version.as_deref(), Some("2.8.10"));

        let result = HistoryEntry::new(key, AppState::Removing, 0);
        assert!(matches!(
            result,
            Err(Error::IllegalStateTransition { to: AppState::Removing, .. })
        ));
    }
}
