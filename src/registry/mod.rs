// src/registry/mod.rs

//! The identity map of canonical application records
//!
//! This module handles:
//! - Handing out exactly one shared record per identity key
//! - Folding transient backend records into the canonical one
//! - Serializing writers per record so readers never see half a merge
//!
//! Records live as long as the registry. Backends may call in from any
//! thread; the map lock is never held while a record lock is taken.

use crate::app::{App, AppKind, AppState, IdentityKey};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tracing::debug;

pub use crate::app::MergePolicy;

/// A canonical record shared between backends and readers
#[derive(Debug, Clone)]
pub struct SharedApp(Arc<RwLock<App>>);

impl SharedApp {
    fn new(app: App) -> Self {
        Self(Arc::new(RwLock::new(app)))
    }

    /// Lock for reading; the record is always fully merged
    pub fn read(&self) -> RwLockReadGuard<'_, App> {
        self.0.read()
    }

    /// Lock for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, App> {
        self.0.write()
    }

    /// Whether both handles point at the same record
    pub fn ptr_eq(&self, other: &SharedApp) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn key(&self) -> IdentityKey {
        self.read().key().clone()
    }

    /// See [`App::set_state`]
    pub fn set_state(&self, state: AppState) -> bool {
        self.write().set_state(state)
    }

    /// See [`App::set_kind`]
    pub fn set_kind(&self, kind: AppKind) -> bool {
        self.write().set_kind(kind)
    }
}

/// Identity map from key to the single canonical record
#[derive(Debug, Default)]
pub struct Registry {
    apps: Mutex<BTreeMap<IdentityKey, SharedApp>>,
    policy: MergePolicy,
}

impl Registry {
    /// Create an empty registry with the default merge policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            apps: Mutex::new(BTreeMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Return the canonical record for `key`, creating an empty one on
    /// first reference.
    ///
    /// Concurrent callers with the same key always get the same record.
    pub fn get_or_create(&self, key: &IdentityKey) -> SharedApp {
        let mut apps = self.apps.lock();
        apps.entry(key.clone())
            .or_insert_with(|| {
                debug!("Creating record for {}", key);
                SharedApp::new(App::new(key.clone()))
            })
            .clone()
    }

    /// Look up a record without creating it
    pub fn get(&self, key: &IdentityKey) -> Option<SharedApp> {
        self.apps.lock().get(key).cloned()
    }

    /// Merge a transient record into a canonical one under its write lock
    pub fn subsume(&self, canonical: &SharedApp, incoming: &App) {
        canonical.write().subsume(incoming, &self.policy);
    }

    /// Adopt `incoming` as the canonical record if its key is new,
    /// otherwise subsume it into the existing record
    pub fn merge(&self, incoming: App) -> SharedApp {
        let canonical = {
            let mut apps = self.apps.lock();
            match apps.entry(incoming.key().clone()) {
                Entry::Vacant(entry) => {
                    debug!("Adopting {} as canonical record", entry.key());
                    return entry.insert(SharedApp::new(incoming)).clone();
                }
                Entry::Occupied(entry) => entry.get().clone(),
            }
        };

        debug!("Subsuming {} into canonical record", incoming.key());
        self.subsume(&canonical, &incoming);
        canonical
    }

    pub fn len(&self) -> usize {
        self.apps.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.lock().is_empty()
    }

    /// All keys, in order
    pub fn keys(&self) -> Vec<IdentityKey> {
        self.apps.lock().keys().cloned().collect()
    }

    /// All records, ordered by key
    pub fn snapshot(&self) -> Vec<SharedApp> {
        self.apps.lock().values().cloned().collect()
    }
}
