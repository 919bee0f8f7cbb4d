//! S3-compatible object-storage backend.
//!
//! Credential selection priority: an explicit profile named by the user,
//! then a profile implied by the ambient `AWS_PROFILE` environment, then
//! anonymous access. Each path is logged (never credential values).

mod filesystem;

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::connector::Connector;
use crate::fs::RemoteFilesystem;

pub use self::filesystem::S3Filesystem;

/// S3 connection settings, parsed from the settings JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct S3Settings {
    /// Named credentials profile; empty means "ambient or anonymous".
    pub profile: String,
    /// Remote path to root the browser at (`/` lists buckets).
    pub root: String,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            profile: String::new(),
            root: "/".to_string(),
        }
    }
}

/// Connector producing [`S3Filesystem`] handles.
pub struct S3Connector;

impl S3Connector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for S3Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for S3Connector {
    fn type_id(&self) -> &str {
        "s3fs"
    }

    fn display_name(&self) -> &str {
        "S3"
    }

    fn connect(&self, settings: &serde_json::Value) -> Option<(Arc<dyn RemoteFilesystem>, String)> {
        let settings: S3Settings = match serde_json::from_value(settings.clone()) {
            Ok(s) => s,
            Err(e) => {
                warn!("invalid S3 settings: {e}");
                return None;
            }
        };
        let root = if settings.root.is_empty() {
            "/".to_string()
        } else {
            settings.root.clone()
        };

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("failed to start S3 runtime: {e}");
                return None;
            }
        };

        let config = runtime.block_on(async {
            if !settings.profile.is_empty() {
                info!("connecting to {root} using profile {}", settings.profile);
                aws_config::defaults(BehaviorVersion::latest())
                    .profile_name(&settings.profile)
                    .load()
                    .await
            } else if let Ok(ambient) = std::env::var("AWS_PROFILE") {
                info!("connecting to {root} using ambient profile {ambient}");
                aws_config::defaults(BehaviorVersion::latest()).load().await
            } else {
                info!("connecting to {root} anonymously");
                aws_config::defaults(BehaviorVersion::latest())
                    .no_credentials()
                    .load()
                    .await
            }
        });

        let client = Client::new(&config);
        Some((Arc::new(S3Filesystem::new(client, runtime)), root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_parse_with_defaults() {
        let settings: S3Settings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(settings.profile.is_empty());
        assert_eq!(settings.root, "/");
    }

    #[test]
    fn settings_parse_profile_and_root() {
        let value = serde_json::json!({ "profile": "lab", "root": "/my-bucket/data" });
        let settings: S3Settings = serde_json::from_value(value).unwrap();
        assert_eq!(settings.profile, "lab");
        assert_eq!(settings.root, "/my-bucket/data");
    }
}
