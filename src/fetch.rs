//! One-at-a-time background fetch of remote files into a local cache.
//!
//! The orchestrator drives the per-node state machine
//! `Idle → Fetching → Cached` (no reverse transition). The download itself
//! runs on a dedicated worker thread; completions come back over a channel
//! that [`poll()`](FetchOrchestrator::poll) drains on the interactive
//! thread, so node state is always mutated before the corresponding event
//! is handed out — a consumer re-reading state after an event never sees a
//! stale value.
//!
//! Concurrency contract: at most one fetch in flight; a second
//! [`request()`](FetchOrchestrator::request) while busy is rejected with
//! [`FetchError::Busy`]. There is no cancellation — dropping the
//! orchestrator detaches the worker and discards its completion.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{info, warn};

use crate::errors::{FetchError, FsError};
use crate::fs::RemoteFilesystem;
use crate::tree::{FetchState, FsTreeModel, NodeId};

/// Deterministic local cache layout: a fixed root directory with the
/// remote path (leading separator stripped) preserved underneath, so
/// re-fetching the same remote path always reuses the same location.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local destination for a remote path.
    pub fn local_path(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

/// Events emitted by the fetch workflow.
pub enum FetchEvent {
    /// A background download started for this node.
    Started { node: NodeId },
    /// The file is available locally; hand `local_path` to the host's
    /// open-by-path entry point.
    FileReady { node: NodeId, local_path: PathBuf },
    /// A directory in a container format was activated; the collaborator
    /// can read it directly from the remote filesystem, no local copy.
    ContainerSelected {
        fs: Arc<dyn RemoteFilesystem>,
        path: String,
    },
    /// The download failed; the node is back to `Idle` and may be retried.
    Failed { node: NodeId, error: String },
}

impl fmt::Debug for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEvent::Started { node } => f.debug_struct("Started").field("node", node).finish(),
            FetchEvent::FileReady { node, local_path } => f
                .debug_struct("FileReady")
                .field("node", node)
                .field("local_path", local_path)
                .finish(),
            FetchEvent::ContainerSelected { path, .. } => f
                .debug_struct("ContainerSelected")
                .field("path", path)
                .finish(),
            FetchEvent::Failed { node, error } => f
                .debug_struct("Failed")
                .field("node", node)
                .field("error", error)
                .finish(),
        }
    }
}

/// Completion message from the worker thread.
struct Outcome {
    node: NodeId,
    local_path: PathBuf,
    result: Result<(), FsError>,
}

/// Drives one background download per user action against one tree model.
///
/// Lives alongside the model for the duration of a connection and is
/// discarded with it on disconnect.
pub struct FetchOrchestrator {
    cache: CacheLayout,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
    in_flight: Option<NodeId>,
}

impl FetchOrchestrator {
    pub fn new(cache: CacheLayout) -> Self {
        let (tx, rx) = channel();
        Self {
            cache,
            tx,
            rx,
            in_flight: None,
        }
    }

    pub fn cache(&self) -> &CacheLayout {
        &self.cache
    }

    /// Whether a download is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Handle activation (double-click) of a node.
    ///
    /// - Container directory (openable suffix): immediate
    ///   [`FetchEvent::ContainerSelected`], no download.
    /// - Plain directory, inert node, or non-openable file: no-op (`None`).
    /// - Cached file whose local artifact still exists: immediate
    ///   [`FetchEvent::FileReady`] with the existing path, no re-download.
    ///   A cached node whose artifact vanished is re-fetched.
    /// - Otherwise the node transitions to `Fetching`, a worker starts,
    ///   and [`FetchEvent::Started`] is returned; completion arrives via
    ///   [`poll()`](Self::poll).
    pub fn request(
        &mut self,
        model: &mut FsTreeModel,
        node: NodeId,
    ) -> Result<Option<FetchEvent>, FetchError> {
        if model.is_dir(node) {
            if model.is_openable(node) {
                let path = model.path(node).to_string();
                info!("container directory selected: {path}");
                return Ok(Some(FetchEvent::ContainerSelected {
                    fs: model.filesystem(),
                    path,
                }));
            }
            return Ok(None);
        }

        if !model.is_file(node) || !model.is_openable(node) {
            return Ok(None);
        }

        let remote_path = model.path(node).to_string();
        let local_path = self.cache.local_path(&remote_path);

        if model.fetch_state(node) == FetchState::Cached && local_path.exists() {
            info!("already cached at {}", local_path.display());
            return Ok(Some(FetchEvent::FileReady { node, local_path }));
        }

        if self.in_flight.is_some() {
            return Err(FetchError::Busy);
        }

        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("fetching {remote_path} -> {}", local_path.display());
        model.set_fetch_state(node, FetchState::Fetching);
        self.in_flight = Some(node);

        let fs = model.filesystem();
        let tx = self.tx.clone();
        let worker_local = local_path.clone();
        thread::spawn(move || {
            let result = fs.fetch(&remote_path, &worker_local);
            // Receiver gone means the connection was torn down; the
            // completion is simply discarded.
            let _ = tx.send(Outcome {
                node,
                local_path: worker_local,
                result,
            });
        });

        Ok(Some(FetchEvent::Started { node }))
    }

    /// Drain worker completions, mutating node state before returning the
    /// corresponding events. Call from the interactive thread.
    pub fn poll(&mut self, model: &mut FsTreeModel) -> Vec<FetchEvent> {
        let mut events = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            self.in_flight = None;
            match outcome.result {
                Ok(()) => {
                    model.set_fetch_state(outcome.node, FetchState::Cached);
                    info!("cached file to {}", outcome.local_path.display());
                    events.push(FetchEvent::FileReady {
                        node: outcome.node,
                        local_path: outcome.local_path,
                    });
                }
                Err(e) => {
                    model.set_fetch_state(outcome.node, FetchState::Idle);
                    warn!("fetch failed for {}: {e}", model.path(outcome.node));
                    events.push(FetchEvent::Failed {
                        node: outcome.node,
                        error: e.to_string(),
                    });
                }
            }
        }
        events
    }
}
