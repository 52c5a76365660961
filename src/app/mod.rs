// src/app/mod.rs

//! Application records
//!
//! An `App` is everything the catalog knows about one logical application:
//! its identity, lifecycle state, kind, descriptive text and the
//! cross-references other backends contributed. Records are built by
//! backends as transient values and folded into the canonical record held
//! by the registry with [`App::subsume`].
//!
//! State and kind are private and only change through the state machines.
//! Every setter returns whether it changed anything, so the caller can
//! decide what to announce.

pub mod history;
pub mod identity;
pub mod kudos;
pub mod quality;
pub mod state;
pub mod version;

pub use history::HistoryEntry;
pub use identity::{IdentityKey, RelatedKey};
pub use kudos::Kudos;
pub use quality::{Quality, Tagged, TextField};
pub use state::{AppKind, AppState};

use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use tracing::{debug, warn};

/// Rating has not been set
pub const RATING_UNSET: i32 = -1;

/// Install date has not been set
pub const INSTALL_DATE_UNSET: u64 = 0;

/// Installed at an unknown time (one second past the epoch)
pub const INSTALL_DATE_UNKNOWN: u64 = 1;

/// Size has not been computed
pub const SIZE_UNKNOWN: u64 = 0;

/// Size cannot be computed
pub const SIZE_MISSING: u64 = 1;

/// What kind of thing the id names
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdKind {
    #[default]
    Unknown,
    Desktop,
    InputMethod,
    Font,
    Codec,
    WebApp,
    Source,
    Addon,
    Firmware,
}

impl IdKind {
    pub fn as_str(&self) -> &str {
        match self {
            IdKind::Unknown => "unknown",
            IdKind::Desktop => "desktop",
            IdKind::InputMethod => "input-method",
            IdKind::Font => "font",
            IdKind::Codec => "codec",
            IdKind::WebApp => "web-app",
            IdKind::Source => "source",
            IdKind::Addon => "addon",
            IdKind::Firmware => "firmware",
        }
    }
}

/// Who produced the rating
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingKind {
    #[default]
    Unknown,
    User,
    System,
    Kudos,
}

impl RatingKind {
    pub fn as_str(&self) -> &str {
        match self {
            RatingKind::Unknown => "unknown",
            RatingKind::User => "user",
            RatingKind::System => "system",
            RatingKind::Kudos => "kudos",
        }
    }
}

impl FromStr for RatingKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(RatingKind::Unknown),
            "user" => Ok(RatingKind::User),
            "system" => Ok(RatingKind::System),
            "kudos" => Ok(RatingKind::Kudos),
            _ => Err(Error::InvalidValue(format!("Invalid rating kind: {}", s))),
        }
    }
}

/// Merge behaviour for [`App::subsume`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// Also merge name, summary and description (quality-gated).
    ///
    /// Off by default: curated text already on the canonical record is not
    /// replaced by whatever a later backend happens to report.
    pub propagate_text: bool,
}

/// Store `value` in `slot`, reporting whether it differed
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// One application, package or source as seen by the catalog
#[derive(Debug, Clone)]
pub struct App {
    key: IdentityKey,
    id_kind: IdKind,
    state: AppState,
    kind: AppKind,
    name: Tagged<String>,
    summary: Tagged<String>,
    description: Tagged<String>,
    version: Option<String>,
    version_ui: Option<String>,
    update_version: Option<String>,
    update_version_ui: Option<String>,
    update_details: Option<String>,
    summary_missing: Option<String>,
    menu_path: Option<String>,
    origin: Option<String>,
    management_plugin: Option<String>,
    icon: Option<String>,
    rating: i32,
    rating_confidence: i32,
    rating_kind: RatingKind,
    install_date: u64,
    size: u64,
    sources: IndexSet<String>,
    source_ids: IndexSet<String>,
    addons: IndexSet<IdentityKey>,
    related: IndexSet<RelatedKey>,
    history: Vec<HistoryEntry>,
    metadata: BTreeMap<String, String>,
    kudos: Kudos,
    to_be_installed: bool,
}

impl App {
    /// Create an empty record in state `Unknown` with kind `Unknown`
    pub fn new(key: IdentityKey) -> Self {
        Self {
            key,
            id_kind: IdKind::Unknown,
            state: AppState::Unknown,
            kind: AppKind::Unknown,
            name: Tagged::default(),
            summary: Tagged::default(),
            description: Tagged::default(),
            version: None,
            version_ui: None,
            update_version: None,
            update_version_ui: None,
            update_details: None,
            summary_missing: None,
            menu_path: None,
            origin: None,
            management_plugin: None,
            icon: None,
            rating: RATING_UNSET,
            rating_confidence: RATING_UNSET,
            rating_kind: RatingKind::Unknown,
            install_date: INSTALL_DATE_UNSET,
            size: SIZE_UNKNOWN,
            sources: IndexSet::new(),
            source_ids: IndexSet::new(),
            addons: IndexSet::new(),
            related: IndexSet::new(),
            history: Vec::new(),
            metadata: BTreeMap::new(),
            kudos: Kudos::empty(),
            to_be_installed: false,
        }
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    // --- state machines ---

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Move the lifecycle state along a legal edge.
    ///
    /// Returns `Ok(false)` when already in `state`. Entering a state in
    /// which the application is not installed clears the install date.
    pub fn try_set_state(&mut self, state: AppState) -> Result<bool> {
        if self.state == state {
            return Ok(false);
        }

        if !state::can_transition(self.state, state) {
            return Err(Error::IllegalStateTransition {
                id: self.id().to_string(),
                from: self.state,
                to: state,
            });
        }

        self.state = state;
        if state.clears_install_date() {
            self.install_date = INSTALL_DATE_UNSET;
        }
        Ok(true)
    }

    /// Like [`App::try_set_state`], logging a refused transition
    pub fn set_state(&mut self, state: AppState) -> bool {
        match self.try_set_state(state) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    pub fn kind(&self) -> AppKind {
        self.kind
    }

    /// Change the kind along a legal edge; `Ok(false)` when unchanged
    pub fn try_set_kind(&mut self, kind: AppKind) -> Result<bool> {
        if self.kind == kind {
            return Ok(false);
        }

        if !state::can_change_kind(self.kind, kind) {
            return Err(Error::IllegalKindTransition {
                id: self.id().to_string(),
                from: self.kind,
                to: kind,
            });
        }

        self.kind = kind;
        Ok(true)
    }

    /// Like [`App::try_set_kind`], logging a refused transition
    pub fn set_kind(&mut self, kind: AppKind) -> bool {
        match self.try_set_kind(kind) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    pub fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    pub fn set_id_kind(&mut self, id_kind: IdKind) -> bool {
        replace(&mut self.id_kind, id_kind)
    }

    // --- quality-tagged text ---

    fn text_mut(&mut self, field: TextField) -> &mut Tagged<String> {
        match field {
            TextField::Name => &mut self.name,
            TextField::Summary => &mut self.summary,
            TextField::Description => &mut self.description,
        }
    }

    /// Offer a text value; accepted only at or above the field's quality
    pub fn set_text(&mut self, field: TextField, quality: Quality, value: impl Into<String>) -> bool {
        self.text_mut(field).set(quality, value.into())
    }

    pub fn text(&self, field: TextField) -> &Tagged<String> {
        match field {
            TextField::Name => &self.name,
            TextField::Summary => &self.summary,
            TextField::Description => &self.description,
        }
    }

    /// The short localized name, e.g. "Calculator"
    pub fn set_name(&mut self, quality: Quality, name: impl Into<String>) -> bool {
        self.set_text(TextField::Name, quality, name)
    }

    /// The one-line description, e.g. "A graphical calculator"
    pub fn set_summary(&mut self, quality: Quality, summary: impl Into<String>) -> bool {
        self.set_text(TextField::Summary, quality, summary)
    }

    /// The multi-line description
    pub fn set_description(&mut self, quality: Quality, description: impl Into<String>) -> bool {
        self.set_text(TextField::Description, quality, description)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    // --- versions ---

    fn refresh_ui_versions(&mut self) {
        let (version_ui, update_version_ui) =
            version::ui_versions(self.version.as_deref(), self.update_version.as_deref());
        self.version_ui = version_ui;
        self.update_version_ui = update_version_ui;
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The version shown to users, e.g. "1.6.2" for "1:1.6.2-7.fc17"
    pub fn version_ui(&self) -> Option<&str> {
        self.version_ui.as_deref()
    }

    /// Set the raw version, e.g. "2:1.2.3.fc19"
    pub fn set_version(&mut self, version: impl Into<String>) -> bool {
        if !replace(&mut self.version, Some(version.into())) {
            return false;
        }
        self.refresh_ui_versions();
        true
    }

    pub fn update_version(&self) -> Option<&str> {
        self.update_version.as_deref()
    }

    pub fn update_version_ui(&self) -> Option<&str> {
        self.update_version_ui.as_deref()
    }

    /// Set the raw version of the pending update
    pub fn set_update_version(&mut self, update_version: impl Into<String>) -> bool {
        if !replace(&mut self.update_version, Some(update_version.into())) {
            return false;
        }
        self.refresh_ui_versions();
        true
    }

    pub fn update_details(&self) -> Option<&str> {
        self.update_details.as_deref()
    }

    pub fn set_update_details(&mut self, update_details: impl Into<String>) -> bool {
        replace(&mut self.update_details, Some(update_details.into()))
    }

    // --- plain attributes ---

    pub fn summary_missing(&self) -> Option<&str> {
        self.summary_missing.as_deref()
    }

    /// Text shown in place of a summary for missing codecs and fonts
    pub fn set_summary_missing(&mut self, summary_missing: impl Into<String>) -> bool {
        replace(&mut self.summary_missing, Some(summary_missing.into()))
    }

    pub fn menu_path(&self) -> Option<&str> {
        self.menu_path.as_deref()
    }

    pub fn set_menu_path(&mut self, menu_path: impl Into<String>) -> bool {
        replace(&mut self.menu_path, Some(menu_path.into()))
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The original source of the application to show in the UI, e.g. "Fedora"
    pub fn set_origin(&mut self, origin: impl Into<String>) -> bool {
        replace(&mut self.origin, Some(origin.into()))
    }

    pub fn management_plugin(&self) -> Option<&str> {
        self.management_plugin.as_deref()
    }

    /// The backend that can install and remove this record, e.g. "packagekit"
    pub fn set_management_plugin(&mut self, plugin: impl Into<String>) -> bool {
        replace(&mut self.management_plugin, Some(plugin.into()))
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Icon name or path; never loaded here
    pub fn set_icon(&mut self, icon: impl Into<String>) -> bool {
        replace(&mut self.icon, Some(icon.into()))
    }

    /// Rating from 0 to 100, or `RATING_UNSET`
    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn set_rating(&mut self, rating: i32) -> bool {
        if !(RATING_UNSET..=100).contains(&rating) {
            warn!("Ignoring rating {} for {}", rating, self.id());
            return false;
        }
        replace(&mut self.rating, rating)
    }

    /// How confident the rating is statistically valid, as a percentage,
    /// or `RATING_UNSET`
    pub fn rating_confidence(&self) -> i32 {
        self.rating_confidence
    }

    pub fn set_rating_confidence(&mut self, confidence: i32) -> bool {
        if !(RATING_UNSET..=100).contains(&confidence) {
            warn!("Ignoring rating confidence {} for {}", confidence, self.id());
            return false;
        }
        replace(&mut self.rating_confidence, confidence)
    }

    pub fn rating_kind(&self) -> RatingKind {
        self.rating_kind
    }

    pub fn set_rating_kind(&mut self, rating_kind: RatingKind) -> bool {
        replace(&mut self.rating_kind, rating_kind)
    }

    /// Seconds since the epoch, `INSTALL_DATE_UNSET` or `INSTALL_DATE_UNKNOWN`
    pub fn install_date(&self) -> u64 {
        self.install_date
    }

    pub fn set_install_date(&mut self, install_date: u64) -> bool {
        replace(&mut self.install_date, install_date)
    }

    /// Size in bytes, `SIZE_UNKNOWN` or `SIZE_MISSING`
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) -> bool {
        replace(&mut self.size, size)
    }

    pub fn to_be_installed(&self) -> bool {
        self.to_be_installed
    }

    /// Mark the record as waiting on a user action to install
    pub fn set_to_be_installed(&mut self, to_be_installed: bool) -> bool {
        replace(&mut self.to_be_installed, to_be_installed)
    }

    pub fn metadata_item(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Backend-private key/value data, e.g. `XdgApp::type = runtime`
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.metadata.insert(key.into(), value.clone()) {
            Some(previous) => previous != value,
            None => true,
        }
    }

    // --- sources ---

    /// The first source package name, if any
    pub fn source_default(&self) -> Option<&str> {
        self.sources.first().map(String::as_str)
    }

    pub fn sources(&self) -> impl ExactSizeIterator<Item = &str> {
        self.sources.iter().map(String::as_str)
    }

    /// Add a source package name unless already present
    pub fn add_source(&mut self, source: impl Into<String>) -> bool {
        self.sources.insert(source.into())
    }

    /// Replace all source package names, e.g. `["gnome-calculator"]`
    pub fn set_sources<I, S>(&mut self, sources: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: IndexSet<String> = sources.into_iter().map(Into::into).collect();
        if self.sources.iter().eq(sources.iter()) {
            return false;
        }
        self.sources = sources;
        true
    }

    pub fn source_id_default(&self) -> Option<&str> {
        self.source_ids.first().map(String::as_str)
    }

    pub fn source_ids(&self) -> impl ExactSizeIterator<Item = &str> {
        self.source_ids.iter().map(String::as_str)
    }

    /// Add a backend-internal id, e.g. "gnome-calculator;0.134;fedora"
    pub fn add_source_id(&mut self, source_id: impl Into<String>) -> bool {
        self.source_ids.insert(source_id.into())
    }

    pub fn set_source_ids<I, S>(&mut self, source_ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source_ids: IndexSet<String> = source_ids.into_iter().map(Into::into).collect();
        if self.source_ids.iter().eq(source_ids.iter()) {
            return false;
        }
        self.source_ids = source_ids;
        true
    }

    // --- cross references ---

    pub fn addons(&self) -> impl ExactSizeIterator<Item = &IdentityKey> {
        self.addons.iter()
    }

    /// Record `addon` as an add-on of this application, once per id
    pub fn add_addon(&mut self, addon: &App) -> bool {
        self.add_addon_key(IdentityKey::new(addon.id()))
    }

    pub fn add_addon_key(&mut self, key: IdentityKey) -> bool {
        if self.addons.contains(&key) {
            debug!("Already added {} as an addon", key);
            return false;
        }
        self.addons.insert(key)
    }

    pub fn related(&self) -> impl ExactSizeIterator<Item = &RelatedKey> {
        self.related.iter()
    }

    /// Record `other` as related, once per id and default source
    pub fn add_related(&mut self, other: &App) -> bool {
        self.add_related_key(RelatedKey::of(other))
    }

    pub fn add_related_key(&mut self, key: RelatedKey) -> bool {
        if self.related.contains(&key) {
            debug!("Already added {} as a related item", key);
            return false;
        }
        self.related.insert(key)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Append to the timeline; entries are never merged
    pub fn add_history(&mut self, entry: HistoryEntry) -> bool {
        self.history.push(entry);
        true
    }

    // --- kudos ---

    pub fn kudos(&self) -> Kudos {
        self.kudos
    }

    pub fn add_kudo(&mut self, kudo: Kudos) -> bool {
        let before = self.kudos;
        self.kudos |= kudo;
        self.kudos != before
    }

    pub fn kudos_weight(&self) -> u32 {
        self.kudos.weight()
    }

    pub fn kudos_percentage(&self) -> u32 {
        self.kudos.percentage()
    }

    // --- merging ---

    fn offer_state_quietly(&mut self, state: AppState) {
        if let Err(e) = self.try_set_state(state) {
            debug!("Not merging state: {}", e);
        }
    }

    /// Import everything useful from a transient record into this one.
    ///
    /// Never fails: data that cannot be merged is dropped. Text fields are
    /// only merged when `policy.propagate_text` is set.
    pub fn subsume(&mut self, other: &App, policy: &MergePolicy) {
        // an updatable package is more information than just installed,
        // but the machine has no direct edge between the two
        if other.state == AppState::Updatable && self.state == AppState::Installed {
            self.offer_state_quietly(AppState::Unknown);
            self.offer_state_quietly(AppState::Updatable);
        }

        if self.state == AppState::Unknown && other.state != AppState::Unknown {
            self.offer_state_quietly(other.state);
        }

        if other.kind != AppKind::Unknown {
            if let Err(e) = self.try_set_kind(other.kind) {
                debug!("Not merging kind: {}", e);
            }
        }

        if !other.sources.is_empty() {
            self.sources = other.sources.clone();
        }

        if policy.propagate_text {
            for field in [TextField::Name, TextField::Summary, TextField::Description] {
                let incoming = other.text(field);
                if let Some(value) = incoming.get() {
                    self.set_text(field, incoming.quality(), value.clone());
                }
            }
        }

        if let Some(details) = &other.update_details {
            self.update_details = Some(details.clone());
        }
        if let Some(update_version) = &other.update_version {
            self.set_update_version(update_version.clone());
        }
        if let Some(icon) = &other.icon {
            self.icon = Some(icon.clone());
        }

        for key in &other.related {
            self.add_related_key(key.clone());
        }

        self.kudos |= other.kudos;
    }

    /// Human-readable dump of every populated attribute
    pub fn to_debug_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::from("AppRecord:\n");
        let mut line = |label: &str, value: &dyn fmt::Display| {
            let _ = writeln!(out, "\t{}:\t{}", label, value);
        };

        line("kind", &self.kind);
        if self.id_kind != IdKind::Unknown {
            line("id-kind", &self.id_kind.as_str());
        }
        line("state", &self.state);
        line("id", &self.key);
        for name in self.kudos.names() {
            line("kudo", &name);
        }
        line("kudo-percentage", &self.kudos.percentage());

        let optional = [
            ("name", self.name()),
            ("icon", self.icon()),
            ("version", self.version()),
            ("version-ui", self.version_ui()),
            ("update-version", self.update_version()),
            ("update-version-ui", self.update_version_ui()),
            ("update-details", self.update_details()),
            ("summary", self.summary()),
            ("description", self.description()),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                line(label, &value);
            }
        }

        for (i, source) in self.sources.iter().enumerate() {
            line(&format!("source-{:02}", i), source);
        }
        for (i, source_id) in self.source_ids.iter().enumerate() {
            line(&format!("source-id-{:02}", i), source_id);
        }

        let optional = [
            ("summary-missing", self.summary_missing()),
            ("menu-path", self.menu_path()),
            ("origin", self.origin()),
            ("management-plugin", self.management_plugin()),
        ];
        for (label, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                line(label, &value);
            }
        }

        if self.rating != RATING_UNSET {
            line("rating", &self.rating);
        }
        if self.rating_confidence != RATING_UNSET {
            line("rating-confidence", &self.rating_confidence);
        }
        if self.rating_kind != RatingKind::Unknown {
            line("rating-kind", &self.rating_kind.as_str());
        }
        if self.install_date != INSTALL_DATE_UNSET {
            line("install-date", &self.install_date);
        }
        if self.size != SIZE_UNKNOWN {
            line("size", &format!("{}k", self.size / 1024));
        }
        if !self.addons.is_empty() {
            line("addons", &self.addons.len());
        }
        if !self.related.is_empty() {
            line("related", &self.related.len());
        }
        if !self.history.is_empty() {
            line("history", &self.history.len());
        }
        if self.to_be_installed {
            line("to-be-installed", &true);
        }
        for (key, value) in &self.metadata {
            line(&format!("{{{}}}", key), value);
        }

        f.write_str(&out)
    }
}
