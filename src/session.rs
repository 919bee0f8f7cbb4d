//! Browser session: the connect/browse/fetch workflow in one place.
//!
//! Owns the connector registry, the persisted per-backend defaults, the
//! host-provided openable-suffix set, and — while connected — the
//! `(model, orchestrator)` pair for the active backend. This is the
//! surface a host UI drives: populate a backend selector from
//! [`available_types()`](BrowserSession::available_types), connect with
//! form values, hand the model to a tree widget, route double-clicks
//! through [`activate()`](BrowserSession::activate) and pump
//! [`poll_and_dispatch()`](BrowserSession::poll_and_dispatch) from the
//! interactive thread.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::connector::{ConnectorInfo, ConnectorRegistry};
use crate::errors::{BrowserError, FetchError};
use crate::fetch::{CacheLayout, FetchEvent, FetchOrchestrator};
use crate::host::{dispatch, FileOpener};
use crate::settings::{BrowserSettings, SettingsStorage};
use crate::tree::{FsTreeModel, NodeId};

struct ActiveConnection {
    type_id: String,
    model: FsTreeModel,
    orchestrator: FetchOrchestrator,
}

/// One browsing session over a set of registered backends.
///
/// At most one backend is connected at a time; connecting tears down any
/// previous connection first. Disconnecting discards the whole node
/// structure; an in-flight download is not aborted, its completion is
/// discarded with the channel.
pub struct BrowserSession {
    registry: ConnectorRegistry,
    storage: Option<SettingsStorage>,
    settings: BrowserSettings,
    openable: Vec<String>,
    cache: CacheLayout,
    active: Option<ActiveConnection>,
}

impl BrowserSession {
    /// Session without settings persistence.
    pub fn new(
        registry: ConnectorRegistry,
        openable_suffixes: impl IntoIterator<Item = String>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            storage: None,
            settings: BrowserSettings::default(),
            openable: openable_suffixes.into_iter().collect(),
            cache: CacheLayout::new(cache_root),
            active: None,
        }
    }

    /// Session backed by persisted defaults, loaded now and saved after
    /// every successful connect.
    pub fn with_storage(
        registry: ConnectorRegistry,
        openable_suffixes: impl IntoIterator<Item = String>,
        cache_root: impl Into<PathBuf>,
        storage: SettingsStorage,
    ) -> Result<Self, BrowserError> {
        let settings = storage.load()?;
        let mut session = Self::new(registry, openable_suffixes, cache_root);
        session.storage = Some(storage);
        session.settings = settings;
        Ok(session)
    }

    /// Registered backends, in registration order.
    pub fn available_types(&self) -> Vec<ConnectorInfo> {
        self.registry.available_types()
    }

    /// Current per-backend defaults (persisted values when storage is
    /// attached).
    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Settings JSON to pre-fill the connection form for a backend.
    pub fn default_settings(&self, type_id: &str) -> Option<serde_json::Value> {
        match type_id {
            "sshfs" => serde_json::to_value(&self.settings.sshfs).ok(),
            "s3fs" => serde_json::to_value(&self.settings.s3fs).ok(),
            _ => None,
        }
    }

    /// Attempt a connection. Returns `Ok(false)` when the backend
    /// reported no connection (bad credentials, unreachable host); the
    /// session then stays disconnected and the previous view is gone —
    /// never an error the UI must special-case.
    pub fn connect_with(
        &mut self,
        type_id: &str,
        settings: &serde_json::Value,
    ) -> Result<bool, BrowserError> {
        self.disconnect();

        let connector = self.registry.create(type_id)?;
        let Some((fs, root)) = connector.connect(settings) else {
            return Ok(false);
        };

        info!("connected, root: {root}");
        let model = FsTreeModel::new(fs, &root, self.openable.iter().cloned());
        self.active = Some(ActiveConnection {
            type_id: type_id.to_string(),
            model,
            orchestrator: FetchOrchestrator::new(self.cache.clone()),
        });
        self.remember(type_id, settings);
        Ok(true)
    }

    /// Discard the tree and the connection.
    pub fn disconnect(&mut self) {
        if self.active.take().is_some() {
            info!("disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Backend identifier of the active connection.
    pub fn connection_type(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.type_id.as_str())
    }

    pub fn model(&self) -> Option<&FsTreeModel> {
        self.active.as_ref().map(|a| &a.model)
    }

    pub fn model_mut(&mut self) -> Option<&mut FsTreeModel> {
        self.active.as_mut().map(|a| &mut a.model)
    }

    /// Handle activation (double-click) of a node. No-op when
    /// disconnected.
    pub fn activate(&mut self, node: NodeId) -> Result<Option<FetchEvent>, FetchError> {
        match self.active.as_mut() {
            Some(active) => active.orchestrator.request(&mut active.model, node),
            None => Ok(None),
        }
    }

    /// Drain fetch completions. Call periodically from the interactive
    /// thread.
    pub fn poll(&mut self) -> Vec<FetchEvent> {
        match self.active.as_mut() {
            Some(active) => active.orchestrator.poll(&mut active.model),
            None => Vec::new(),
        }
    }

    /// [`activate()`](Self::activate) and forward any immediate event to
    /// the host's opener.
    pub fn activate_and_dispatch(
        &mut self,
        node: NodeId,
        opener: &dyn FileOpener,
    ) -> Result<(), FetchError> {
        if let Some(event) = self.activate(node)? {
            dispatch(&event, opener);
        }
        Ok(())
    }

    /// [`poll()`](Self::poll) and forward the events to the host's
    /// opener, returning them for presentation updates.
    pub fn poll_and_dispatch(&mut self, opener: &dyn FileOpener) -> Vec<FetchEvent> {
        let events = self.poll();
        for event in &events {
            dispatch(event, opener);
        }
        events
    }

    /// Fold a successful connection's parameters back into the persisted
    /// defaults. Secrets are not part of the defaults and never touch
    /// disk.
    fn remember(&mut self, type_id: &str, settings: &serde_json::Value) {
        let str_field =
            |key: &str| settings.get(key).and_then(|v| v.as_str()).map(str::to_string);
        match type_id {
            "sshfs" => {
                if let Some(host) = str_field("host") {
                    self.settings.sshfs.host = host;
                }
                if let Some(user) = str_field("user") {
                    self.settings.sshfs.user = user;
                }
                if let Some(port) = settings.get("port").and_then(|v| v.as_u64()) {
                    self.settings.sshfs.port = port as u16;
                }
                if let Some(root) = str_field("root") {
                    self.settings.sshfs.root = root;
                }
            }
            "s3fs" => {
                if let Some(profile) = str_field("profile") {
                    self.settings.s3fs.profile = profile;
                }
                if let Some(root) = str_field("root") {
                    self.settings.s3fs.root = root;
                }
            }
            _ => return,
        }
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&self.settings) {
                warn!("failed to save settings: {e}");
            }
        }
    }
}
