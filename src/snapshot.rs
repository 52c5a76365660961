// src/snapshot.rs

//! Backend snapshots
//!
//! A snapshot is the output of one backend run captured as JSON: the
//! transient records a plugin reported for a search, an installed list or
//! an update list. Each fragment is turned into an [`App`] through the
//! validating setters, so a fragment the state machines would refuse never
//! reaches the registry.

use crate::app::{
    App, AppKind, AppState, HistoryEntry, IdKind, IdentityKey, Kudos, Quality, RatingKind,
    RelatedKey,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Everything one backend reported in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Backend name, e.g. "packagekit"
    pub plugin: String,

    #[serde(default)]
    pub apps: Vec<AppFragment>,
}

/// A text value with the quality the backend vouches for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub quality: Quality,
    pub value: String,
}

/// Reference to another record by id and source package name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedRef {
    pub id: String,
    pub source: Option<String>,
}

/// One event in a package's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFragment {
    /// Source package the event happened to, defaults to the record's
    /// first source
    pub source: Option<String>,
    #[serde(default)]
    pub state: AppState,
    pub timestamp: u64,
    pub version: Option<String>,
}

/// A transient record as reported by a backend; everything but the id is
/// optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppFragment {
    pub id: String,
    pub source: Option<String>,
    pub id_kind: IdKind,
    pub state: AppState,
    pub kind: AppKind,
    pub name: Option<TextValue>,
    pub summary: Option<TextValue>,
    pub description: Option<TextValue>,
    pub version: Option<String>,
    pub update_version: Option<String>,
    pub update_details: Option<String>,
    pub summary_missing: Option<String>,
    pub menu_path: Option<String>,
    pub origin: Option<String>,
    pub management_plugin: Option<String>,
    pub icon: Option<String>,
    pub rating: Option<i32>,
    pub rating_confidence: Option<i32>,
    pub rating_kind: RatingKind,
    pub install_date: Option<u64>,
    pub size: Option<u64>,
    pub sources: Vec<String>,
    pub source_ids: Vec<String>,
    pub kudos: Vec<String>,
    pub related: Vec<RelatedRef>,
    pub addons: Vec<String>,
    pub history: Vec<HistoryFragment>,
    pub metadata: BTreeMap<String, String>,
    pub to_be_installed: bool,
}

impl AppFragment {
    /// Build the transient record this fragment describes.
    ///
    /// `plugin` becomes the management plugin unless the fragment names one.
    pub fn into_app(self, plugin: &str) -> Result<App> {
        if self.id.is_empty() {
            return Err(Error::SnapshotError(format!(
                "Record without id from plugin {}",
                plugin
            )));
        }

        let key = match &self.source {
            Some(source) => IdentityKey::with_source(self.id.clone(), source.clone()),
            None => IdentityKey::new(self.id.clone()),
        };
        let mut app = App::new(key);

        // kind first: it does not depend on anything else
        app.try_set_kind(self.kind)?;
        app.set_id_kind(self.id_kind);
        app.set_sources(self.sources);
        app.set_source_ids(self.source_ids);

        if let Some(name) = self.name {
            app.set_name(name.quality, name.value);
        }
        if let Some(summary) = self.summary {
            app.set_summary(summary.quality, summary.value);
        }
        if let Some(description) = self.description {
            app.set_description(description.quality, description.value);
        }

        if let Some(version) = self.version {
            app.set_version(version);
        }
        if let Some(update_version) = self.update_version {
            app.set_update_version(update_version);
        }
        if let Some(update_details) = self.update_details {
            app.set_update_details(update_details);
        }
        if let Some(summary_missing) = self.summary_missing {
            app.set_summary_missing(summary_missing);
        }
        if let Some(menu_path) = self.menu_path {
            app.set_menu_path(menu_path);
        }
        if let Some(origin) = self.origin {
            app.set_origin(origin);
        }
        app.set_management_plugin(self.management_plugin.unwrap_or_else(|| plugin.to_string()));
        if let Some(icon) = self.icon {
            app.set_icon(icon);
        }

        if let Some(rating) = self.rating {
            app.set_rating(rating);
        }
        if let Some(confidence) = self.rating_confidence {
            app.set_rating_confidence(confidence);
        }
        app.set_rating_kind(self.rating_kind);
        if let Some(size) = self.size {
            app.set_size(size);
        }
        app.set_to_be_installed(self.to_be_installed);

        for name in &self.kudos {
            app.add_kudo(name.parse::<Kudos>()?);
        }

        for related in self.related {
            app.add_related_key(RelatedKey::new(related.id, related.source.as_deref()));
        }
        for addon in self.addons {
            app.add_addon_key(IdentityKey::new(addon));
        }

        for event in self.history {
            let source = event
                .source
                .or_else(|| app.source_default().map(str::to_string))
                .unwrap_or_else(|| app.id().to_string());
            let mut entry =
                HistoryEntry::new(IdentityKey::with_source(app.id(), source), event.state, event.timestamp)?;
            entry.version = event.version;
            app.add_history(entry);
        }

        for (key, value) in self.metadata {
            app.add_metadata(key, value);
        }

        // the state goes last, as entering it may clear the install date
        app.try_set_state(self.state)?;
        if let Some(install_date) = self.install_date {
            app.set_install_date(install_date);
        }

        Ok(app)
    }
}

impl Snapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.plugin.is_empty() {
            return Err(Error::SnapshotError("Snapshot without plugin name".to_string()));
        }
        Ok(snapshot)
    }

    /// Read and parse a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading snapshot from: {}", path.display());
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        info!(
            "Loaded {} records from plugin {}",
            snapshot.apps.len(),
            snapshot.plugin
        );
        Ok(snapshot)
    }

    /// Convert every fragment, skipping the ones the state machines refuse
    pub fn into_apps(self) -> Vec<App> {
        let plugin = self.plugin;
        self.apps
            .into_iter()
            .filter_map(|fragment| {
                let id = fragment.id.clone();
                match fragment.into_app(&plugin) {
                    Ok(app) => Some(app),
                    Err(e) => {
                        warn!("Skipping {} from plugin {}: {}", id, plugin, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGEKIT: &str = r#"{
        "plugin": "packagekit",
        "apps": [
            {
                "id": "gimp.desktop",
                "id_kind": "desktop",
                "state": "installed",
                "kind": "normal",
                "name": { "quality": "normal", "value": "GIMP" },
                "version": "2:2.8.10-1.fc20",
                "sources": ["gimp"],
                "kudos": ["has-screenshots", "has-keywords"],
                "install_date": 1400000000,
                "history": [
                    { "state": "installed", "timestamp": 1390000000, "version": "2.8.8" }
                ],
                "metadata": { "PackageKit::package-id": "gimp;2.8.10;x86_64;fedora" }
            },
            { "id": "broken", "state": "removing" }
        ]
    }"#;

    #[test]
    fn test_fragment_builds_validated_app() {
        let snapshot = Snapshot::from_json(PACKAGEKIT).unwrap();
        assert_eq!(snapshot.apps.len(), 2);

        let apps = snapshot.into_apps();
        assert_eq!(apps.len(), 1, "illegal state from unknown is skipped");

        let app = &apps[0];
        assert_eq!(app.state(), AppState::Installed);
        assert_eq!(app.kind(), AppKind::Normal);
        assert_eq!(app.id_kind(), IdKind::Desktop);
        assert_eq!(app.name(), Some("GIMP"));
        assert_eq!(app.version_ui(), Some("2.8.10"));
        assert_eq!(app.install_date(), 1_400_000_000);
        assert_eq!(app.kudos_percentage(), 25);
        assert_eq!(app.management_plugin(), Some("packagekit"));
        assert_eq!(app.history().len(), 1);
        assert_eq!(app.history()[0].key.source(), Some("gimp"));
        assert_eq!(
            app.metadata_item("PackageKit::package-id"),
            Some("gimp;2.8.10;x86_64;fedora")
        );
    }

    #[test]
    fn test_fragment_rejections() {
        let fragment = AppFragment {
            id: "gimp.desktop".to_string(),
            kudos: vec!["shiny".to_string()],
            ..Default::default()
        };
        assert!(matches!(fragment.into_app("test"), Err(Error::InvalidValue(_))));

        let fragment = AppFragment::default();
        assert!(matches!(fragment.into_app("test"), Err(Error::SnapshotError(_))));

        let fragment = AppFragment {
            id: "gimp.desktop".to_string(),
            state: AppState::Installing,
            ..Default::default()
        };
        assert!(matches!(
            fragment.into_app("test"),
            Err(Error::IllegalStateTransition { .. })
        ));
    }

    #[test]
    fn test_snapshot_requires_plugin() {
        assert!(matches!(
            Snapshot::from_json(r#"{ "plugin": "" }"#),
            Err(Error::SnapshotError(_))
        ));
        assert!(matches!(Snapshot::from_json("not json"), Err(Error::Json(_))));
    }
}
