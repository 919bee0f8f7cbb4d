//! Contracts between the browsing core and the host application.
//!
//! The host owns tool registration, window management and the generic
//! open-by-path command; the core only needs the narrow callback surface
//! defined here. The core never calls [`ToolAdapter`] itself — the host's
//! plugin machinery drives it.

use std::path::Path;
use std::sync::Arc;

use crate::errors::BrowserError;
use crate::fetch::FetchEvent;
use crate::fs::RemoteFilesystem;

/// Callback contract for handing fetched artifacts to the host.
pub trait FileOpener {
    /// A fetched file is available at `path`; open it via the host's
    /// generic open-by-path entry point.
    fn open_local_path(&self, path: &Path);

    /// A container-format directory was selected; the host-side reader
    /// can open it directly from the remote filesystem, streaming, with
    /// no local copy.
    fn open_remote_container(&self, fs: Arc<dyn RemoteFilesystem>, remote_path: &str);
}

/// Narrow adapter for the host's tool-registration and window-management
/// contract. Implemented by the host integration layer; the core never
/// calls it.
pub trait ToolAdapter {
    /// Register the tool with the host's plugin system.
    fn register(&mut self) -> Result<(), BrowserError>;

    /// Build the tool's view using the host's widget toolkit.
    fn build_view(&mut self) -> Result<(), BrowserError>;

    /// Tear the tool down when the host closes it.
    fn teardown(&mut self);
}

/// Forward a fetch event to the host's opener callbacks.
///
/// `Started` and `Failed` are presentation-only (icon changes, status
/// text) and are not forwarded.
pub fn dispatch(event: &FetchEvent, opener: &dyn FileOpener) {
    match event {
        FetchEvent::FileReady { local_path, .. } => opener.open_local_path(local_path),
        FetchEvent::ContainerSelected { fs, path } => {
            opener.open_remote_container(Arc::clone(fs), path)
        }
        FetchEvent::Started { .. } | FetchEvent::Failed { .. } => {}
    }
}
