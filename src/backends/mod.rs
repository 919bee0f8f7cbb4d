//! Concrete [`RemoteFilesystem`](crate::fs::RemoteFilesystem) backends.
//!
//! Each backend depends on its own driver stack (`ssh2`, the AWS SDK) and
//! is gated behind a cargo feature so that consumers needing only one of
//! them can avoid the other's dependency tree.

#[cfg(feature = "s3")]
pub mod s3;
#[cfg(feature = "ssh")]
pub mod ssh;
