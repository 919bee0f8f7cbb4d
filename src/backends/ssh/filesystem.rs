//! SFTP-backed [`RemoteFilesystem`] implementation.
//!
//! Owns a dedicated SSH session in blocking mode. `ssh2` types are `Send`
//! but not `Sync`, so the session state sits behind a `Mutex`; the fetch
//! path and the listing path therefore serialize against each other, which
//! matches the one-fetch-in-flight contract.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use super::auth::{connect_and_authenticate, InteractiveAuth};
use super::SshSettings;
use crate::errors::{ConnectError, FsError};
use crate::fs::path::join;
use crate::fs::{EntryInfo, RemoteFilesystem};

// SFTP status codes surfaced by libssh2.
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_PERMISSION_DENIED: i32 = 3;

struct SftpState {
    _session: ssh2::Session,
    sftp: ssh2::Sftp,
}

/// SFTP filesystem over one authenticated SSH session.
pub struct SftpFilesystem {
    state: Mutex<SftpState>,
}

impl SftpFilesystem {
    /// Connect, authenticate and open the SFTP subsystem.
    pub fn connect(
        settings: &SshSettings,
        interactive: Option<&dyn InteractiveAuth>,
    ) -> Result<Self, ConnectError> {
        let session = connect_and_authenticate(settings, interactive)?;
        session.set_blocking(true);
        let sftp = session
            .sftp()
            .map_err(|e| ConnectError::Handshake(format!("SFTP init failed: {e}")))?;
        Ok(Self {
            state: Mutex::new(SftpState {
                _session: session,
                sftp,
            }),
        })
    }

    fn with_sftp<T>(
        &self,
        f: impl FnOnce(&ssh2::Sftp) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let guard = self
            .state
            .lock()
            .map_err(|e| FsError::OperationFailed(format!("SFTP state poisoned: {e}")))?;
        f(&guard.sftp)
    }
}

fn map_sftp_err(op: &str, path: &str, e: ssh2::Error) -> FsError {
    match e.code() {
        ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => FsError::NotFound(path.to_string()),
        ssh2::ErrorCode::SFTP(SFTP_PERMISSION_DENIED) => {
            FsError::PermissionDenied(path.to_string())
        }
        _ => FsError::OperationFailed(format!("{op} {path}: {e}")),
    }
}

impl RemoteFilesystem for SftpFilesystem {
    fn list(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.with_sftp(|sftp| {
            let entries = sftp
                .readdir(Path::new(path))
                .map_err(|e| map_sftp_err("readdir", path, e))?;

            let mut result = Vec::with_capacity(entries.len());
            for (entry_path, _stat) in entries {
                let name = entry_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if name.is_empty() || name == "." || name == ".." {
                    continue;
                }
                result.push(join(path, &name));
            }
            debug!("sftp readdir {path}: {} entries", result.len());
            Ok(result)
        })
    }

    fn stat(&self, path: &str) -> Result<EntryInfo, FsError> {
        self.with_sftp(|sftp| {
            let stat = sftp
                .stat(Path::new(path))
                .map_err(|e| map_sftp_err("stat", path, e))?;
            if stat.is_dir() {
                Ok(EntryInfo::directory())
            } else {
                Ok(EntryInfo::file(stat.size.unwrap_or(0)))
            }
        })
    }

    fn fetch(&self, remote_path: &str, local_path: &Path) -> Result<(), FsError> {
        self.with_sftp(|sftp| {
            let mut remote = sftp
                .open(Path::new(remote_path))
                .map_err(|e| map_sftp_err("open", remote_path, e))?;
            let mut local = std::fs::File::create(local_path)?;

            let mut buf = [0u8; 32 * 1024];
            loop {
                let n = remote
                    .read(&mut buf)
                    .map_err(|e| FsError::OperationFailed(format!("read {remote_path}: {e}")))?;
                if n == 0 {
                    break;
                }
                local.write_all(&buf[..n])?;
            }
            local.flush()?;
            Ok(())
        })
    }
}
