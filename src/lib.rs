// src/lib.rs

//! Appcat Application Catalog
//!
//! Folds application records reported by many independent backends
//! (package managers, sandboxed-app managers, installer daemons) into one
//! de-duplicated registry.
//!
//! # Architecture
//!
//! - Identity-first: every record is keyed by an `IdentityKey`, and the
//!   registry never holds two records for one key
//! - Subsume: transient backend records are merged into the canonical one
//! - State machines: lifecycle state and kind only move along legal edges
//! - Quality-tagged text: higher-confidence sources win, never the reverse
//! - Kudos: a bitset of quality signals scored into a desirability percentage
//!
//! The `app` and `registry` modules are computation only. File handling for
//! backend snapshots lives in `snapshot`.

pub mod app;
mod error;
pub mod registry;
pub mod snapshot;

pub use app::{App, AppKind, AppState, IdentityKey, Kudos, Quality};
pub use error::{Error, Result};
pub use registry::{MergePolicy, Registry, SharedApp};
