// src/error.rs

use crate::app::{AppKind, AppState};
use thiserror::Error;

/// Core error types for appcat
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A textual value does not name a known state, kind, quality or kudo
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The lifecycle state machine refused a transition
    #[error("State change on {id} from {from} to {to} is not OK")]
    IllegalStateTransition {
        id: String,
        from: AppState,
        to: AppState,
    },

    /// The kind state machine refused a transition
    #[error("Kind change on {id} from {from} to {to} is not OK")]
    IllegalKindTransition {
        id: String,
        from: AppKind,
        to: AppKind,
    },

    /// A snapshot file is structurally valid JSON but semantically unusable
    #[error("Snapshot error: {0}")]
    SnapshotError(String),
}

/// Result type alias using appcat's Error type
pub type Result<T> = std::result::Result<T, Error>;
