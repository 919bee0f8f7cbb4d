//! Persisted default connection parameters.
//!
//! Loaded at startup, saved whenever a connection succeeds, so the forms
//! come up pre-filled with the last working values. Stored as
//! pretty-printed JSON in the platform config directory; the
//! `REMOTE_BROWSER_CONFIG_DIR` environment variable overrides the
//! location. Secrets (passwords, interactive responses) are never part of
//! these structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::BrowserError;

const FILE_NAME: &str = "settings.json";
const CONFIG_DIR_ENV: &str = "REMOTE_BROWSER_CONFIG_DIR";

/// Default SSH connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SshDefaults {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub root: String,
}

impl Default for SshDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            user: String::new(),
            port: 22,
            root: "/".to_string(),
        }
    }
}

/// Default S3 connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct S3Defaults {
    pub profile: String,
    pub root: String,
}

impl Default for S3Defaults {
    fn default() -> Self {
        Self {
            profile: String::new(),
            root: "/".to_string(),
        }
    }
}

/// Per-backend persisted defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserSettings {
    pub sshfs: SshDefaults,
    pub s3fs: S3Defaults,
}

/// Handles reading/writing the settings JSON file.
pub struct SettingsStorage {
    file_path: PathBuf,
}

impl SettingsStorage {
    /// Resolve the config directory and create it if needed.
    pub fn new() -> Result<Self, BrowserError> {
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .ok_or_else(|| BrowserError::Config("no config directory available".into()))?
                .join("remote-browser"),
        };
        Self::with_dir(&config_dir)
    }

    /// Use an explicit directory instead of the platform default.
    pub fn with_dir(dir: &Path) -> Result<Self, BrowserError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            file_path: dir.join(FILE_NAME),
        })
    }

    /// Load settings from disk. Returns the defaults if no file exists.
    pub fn load(&self) -> Result<BrowserSettings, BrowserError> {
        if !self.file_path.exists() {
            debug!("no settings file, using defaults");
            return Ok(BrowserSettings::default());
        }
        let data = fs::read_to_string(&self.file_path)?;
        serde_json::from_str(&data)
            .map_err(|e| BrowserError::Config(format!("failed to parse settings: {e}")))
    }

    /// Save settings to disk (pretty-printed JSON).
    pub fn save(&self, settings: &BrowserSettings) -> Result<(), BrowserError> {
        let data = serde_json::to_string_pretty(settings)
            .map_err(|e| BrowserError::Config(format!("failed to serialize settings: {e}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_values() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.sshfs.host, "127.0.0.1");
        assert_eq!(settings.sshfs.port, 22);
        assert_eq!(settings.sshfs.root, "/");
        assert!(settings.s3fs.profile.is_empty());
        assert_eq!(settings.s3fs.root, "/");
    }

    #[test]
    fn load_returns_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SettingsStorage::with_dir(dir.path()).unwrap();
        let settings = storage.load().unwrap();
        assert_eq!(settings, BrowserSettings::default());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SettingsStorage::with_dir(dir.path()).unwrap();

        let mut settings = BrowserSettings::default();
        settings.sshfs.host = "cluster.example.org".to_string();
        settings.sshfs.user = "alice".to_string();
        settings.sshfs.port = 2222;
        settings.s3fs.profile = "lab".to_string();
        storage.save(&settings).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SettingsStorage::with_dir(dir.path()).unwrap();
        fs::write(
            dir.path().join(FILE_NAME),
            r#"{ "sshfs": { "host": "h", "futureKey": 1 } }"#,
        )
        .unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.sshfs.host, "h");
        // Unstated fields fall back to their defaults.
        assert_eq!(loaded.sshfs.port, 22);
    }
}
