//! Unified error types for the remote-browser crate.
//!
//! Connection errors never escape the connector boundary as `Err` — the
//! [`Connector`](crate::connector::Connector) contract reports them as a
//! `None` handle. The enums here exist for the internal `try_connect`
//! paths, for filesystem operations, and for the fetch orchestrator.

use thiserror::Error;

/// Top-level error type encompassing all crate error categories.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// A connection-establishment error.
    #[error("Connect error: {0}")]
    Connect(#[from] ConnectError),

    /// A remote filesystem operation error.
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    /// A fetch-orchestration error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A configuration error (invalid values, missing fields, parse failures).
    #[error("Config error: {0}")]
    Config(String),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while establishing a backend connection.
///
/// These are caught at the connector boundary, logged, and reported to the
/// caller as "no connection established".
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The remote host could not be reached.
    #[error("Connection failed: {0}")]
    Unreachable(String),

    /// The transport handshake failed.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// All authentication methods were exhausted without success.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The user canceled an interactive authentication challenge.
    #[error("Authentication canceled")]
    Canceled,

    /// The supplied connection settings could not be parsed.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Errors related to remote filesystem operations (list, stat, fetch).
#[derive(Error, Debug)]
pub enum FsError {
    /// The requested path does not exist on the remote filesystem.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Permission was denied for the requested operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The operation failed (protocol error, network interruption, etc.).
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// A low-level I/O error on the local side of a transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the fetch orchestrator before a download starts.
///
/// Download failures themselves are not errors of `request()` — they are
/// delivered as [`FetchEvent::Failed`](crate::fetch::FetchEvent) from
/// `poll()`.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A fetch is already in flight; at most one runs at a time.
    #[error("A fetch is already in flight")]
    Busy,

    /// Local cache directories could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
