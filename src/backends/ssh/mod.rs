//! SSH (SFTP) backend.
//!
//! Connects to an SSH server with password and keyboard-interactive
//! authentication and exposes its filesystem through
//! [`RemoteFilesystem`](crate::fs::RemoteFilesystem).

pub mod auth;
mod filesystem;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::connector::Connector;
use crate::fs::RemoteFilesystem;

pub use self::auth::{AuthPrompt, InteractiveAuth};
pub use self::filesystem::SftpFilesystem;

/// SSH connection settings, parsed from the settings JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Password tried first when present. Never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-collected response replayed for every keyboard-interactive
    /// prompt. Never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kbd_response: Option<String>,
    /// Remote path to root the browser at.
    pub root: String,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            user: String::new(),
            password: None,
            kbd_response: None,
            root: "/".to_string(),
        }
    }
}

/// Connector producing [`SftpFilesystem`] handles.
///
/// An [`InteractiveAuth`] handler can be installed for servers whose
/// keyboard-interactive prompts are not known in advance; the connect call
/// then blocks until the user answers or cancels.
pub struct SshConnector {
    interactive: Option<Box<dyn InteractiveAuth>>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self { interactive: None }
    }

    pub fn with_interactive(handler: Box<dyn InteractiveAuth>) -> Self {
        Self {
            interactive: Some(handler),
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SshConnector {
    fn type_id(&self) -> &str {
        "sshfs"
    }

    fn display_name(&self) -> &str {
        "SSH"
    }

    fn connect(&self, settings: &serde_json::Value) -> Option<(Arc<dyn RemoteFilesystem>, String)> {
        let settings: SshSettings = match serde_json::from_value(settings.clone()) {
            Ok(s) => s,
            Err(e) => {
                warn!("invalid SSH settings: {e}");
                return None;
            }
        };
        if settings.host.is_empty() {
            warn!("no SSH host given");
            return None;
        }

        info!(
            "connecting to {}@{}:{}",
            settings.user, settings.host, settings.port
        );
        match SftpFilesystem::connect(&settings, self.interactive.as_deref()) {
            Ok(fs) => Some((Arc::new(fs), settings.root)),
            Err(e) => {
                warn!("SSH connection failed: {e}");
                None
            }
        }
    }
}
