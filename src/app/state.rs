// src/app/state.rs

//! Lifecycle and kind state machines
//!
//! Every record starts as `AppState::Unknown` / `AppKind::Unknown`. Backends
//! move it along the edges below; anything else is a logic error in the
//! backend and is refused.
//!
//! ```text
//! UPDATABLE --> REMOVING   --> AVAILABLE
//! INSTALLED --> REMOVING   --> AVAILABLE
//! AVAILABLE --> INSTALLING --> INSTALLED
//! AVAILABLE <--> QUEUED    --> INSTALLING --> INSTALLED
//! UNKNOWN   --> UNAVAILABLE
//! ```
//!
//! Kinds only ever generalize:
//!
//! ```text
//! PACKAGE --> NORMAL --> SYSTEM
//! PACKAGE --> SYSTEM | CORE | SOURCE
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an application record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppState {
    #[default]
    Unknown,
    Installed,
    QueuedForInstall,
    Available,
    AvailableLocal,
    Installing,
    Removing,
    Updatable,
    Unavailable,
}

impl AppState {
    pub const ALL: [AppState; 9] = [
        AppState::Unknown,
        AppState::Installed,
        AppState::QueuedForInstall,
        AppState::Available,
        AppState::AvailableLocal,
        AppState::Installing,
        AppState::Removing,
        AppState::Updatable,
        AppState::Unavailable,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AppState::Unknown => "unknown",
            AppState::Installed => "installed",
            AppState::QueuedForInstall => "queued-for-install",
            AppState::Available => "available",
            AppState::AvailableLocal => "available-local",
            AppState::Installing => "installing",
            AppState::Removing => "removing",
            AppState::Updatable => "updatable",
            AppState::Unavailable => "unavailable",
        }
    }

    /// States in which the application is not on the system, so an install
    /// date would be stale
    pub fn clears_install_date(&self) -> bool {
        matches!(
            self,
            AppState::Unknown | AppState::AvailableLocal | AppState::Available
        )
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| Error::InvalidValue(format!("Invalid state: {}", s)))
    }
}

/// Classification of an application record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppKind {
    #[default]
    Unknown,
    /// Desktop application: can be installed, removed and updated
    Normal,
    /// Application that is part of the OS: update only
    System,
    /// Bare package without desktop metadata: update only
    Package,
    /// Aggregated OS update: update only
    OsUpdate,
    /// Metadata-only placeholder for something that cannot be found
    Missing,
    /// Software source (repository or remote)
    Source,
    /// Package critical to the OS: update only
    Core,
}

impl AppKind {
    pub const ALL: [AppKind; 8] = [
        AppKind::Unknown,
        AppKind::Normal,
        AppKind::System,
        AppKind::Package,
        AppKind::OsUpdate,
        AppKind::Missing,
        AppKind::Source,
        AppKind::Core,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AppKind::Unknown => "unknown",
            AppKind::Normal => "normal",
            AppKind::System => "system",
            AppKind::Package => "package",
            AppKind::OsUpdate => "os-update",
            AppKind::Missing => "missing",
            AppKind::Source => "source",
            AppKind::Core => "core",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidValue(format!("Invalid kind: {}", s)))
    }
}

/// Whether the lifecycle machine has an edge `from -> to`.
///
/// A transition to the same state is not an edge; callers treat it as a
/// no-op before consulting the table.
pub fn can_transition(from: AppState, to: AppState) -> bool {
    use AppState::*;

    match from {
        // unknown has to go into one of the stable states
        Unknown => matches!(
            to,
            Installed | QueuedForInstall | Available | AvailableLocal | Updatable | Unavailable
        ),
        Installed => matches!(to, Unknown | Removing),
        QueuedForInstall => matches!(to, Unknown | Installing | Available),
        Available => matches!(to, Unknown | QueuedForInstall | Installing),
        Installing => matches!(to, Unknown | Installed | Available),
        Removing => matches!(to, Unknown | Available | Installed),
        Updatable => matches!(to, Unknown | Removing),
        Unavailable => matches!(to, Unknown | Available),
        AvailableLocal => matches!(to, Unknown | Installing),
    }
}

/// Whether the kind machine has an edge `from -> to`
pub fn can_change_kind(from: AppKind, to: AppKind) -> bool {
    use AppKind::*;

    match from {
        Unknown => true,
        Package => matches!(to, Normal | System | Core | Source | Unknown),
        // normal can only be promoted to system
        Normal => matches!(to, System | Unknown),
        System | OsUpdate | Source | Missing | Core => false,
    }
}
