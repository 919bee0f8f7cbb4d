//! S3-backed [`RemoteFilesystem`] implementation.
//!
//! Maps the remote namespace onto buckets and `/`-delimited object keys:
//! `/` lists buckets, `/bucket` is a directory, `/bucket/a/b` is an object
//! or a common prefix. The AWS SDK is async; this backend owns a private
//! tokio runtime and blocks on it, which keeps the crate-wide blocking
//! [`RemoteFilesystem`] contract intact.

use std::io::Write;
use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::errors::FsError;
use crate::fs::path::normalize;
use crate::fs::{EntryInfo, RemoteFilesystem};

/// S3 filesystem over one configured client.
pub struct S3Filesystem {
    client: Client,
    runtime: tokio::runtime::Runtime,
}

/// Split a normalized path into bucket and key. The root has no bucket;
/// a bare bucket has an empty key.
fn split_bucket(path: &str) -> Option<(&str, &str)> {
    let stripped = path.trim_start_matches('/');
    if stripped.is_empty() {
        return None;
    }
    match stripped.split_once('/') {
        Some((bucket, key)) => Some((bucket, key)),
        None => Some((stripped, "")),
    }
}

fn op_failed(op: &str, path: &str, err: impl std::fmt::Debug + std::fmt::Display) -> FsError {
    FsError::OperationFailed(format!("{op} {path}: {err}"))
}

impl S3Filesystem {
    pub(crate) fn new(client: Client, runtime: tokio::runtime::Runtime) -> Self {
        Self { client, runtime }
    }

    fn list_buckets(&self) -> Result<Vec<String>, FsError> {
        self.runtime.block_on(async {
            let resp = self
                .client
                .list_buckets()
                .send()
                .await
                .map_err(|e| op_failed("list buckets", "/", DisplayErrorContext(&e)))?;
            Ok(resp
                .buckets()
                .iter()
                .filter_map(|b| b.name())
                .map(|name| format!("/{name}"))
                .collect())
        })
    }

    fn list_objects(&self, bucket: &str, key: &str) -> Result<Vec<String>, FsError> {
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        self.runtime.block_on(async {
            let mut result = Vec::new();
            let mut continuation: Option<String> = None;
            loop {
                let mut req = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .delimiter("/");
                if !prefix.is_empty() {
                    req = req.prefix(&prefix);
                }
                if let Some(token) = &continuation {
                    req = req.continuation_token(token);
                }
                let resp = req.send().await.map_err(|e| {
                    op_failed("list", &format!("/{bucket}/{key}"), DisplayErrorContext(&e))
                })?;

                for common in resp.common_prefixes() {
                    if let Some(p) = common.prefix() {
                        result.push(format!("/{bucket}/{}", p.trim_end_matches('/')));
                    }
                }
                for object in resp.contents() {
                    let Some(object_key) = object.key() else {
                        continue;
                    };
                    // Skip the prefix's own marker object.
                    if object_key == prefix {
                        continue;
                    }
                    result.push(format!("/{bucket}/{object_key}"));
                }

                if resp.is_truncated() == Some(true) {
                    continuation = resp.next_continuation_token().map(str::to_string);
                } else {
                    break;
                }
            }
            debug!("s3 list /{bucket}/{key}: {} entries", result.len());
            Ok(result)
        })
    }

    fn stat_object(&self, bucket: &str, key: &str) -> Result<EntryInfo, FsError> {
        self.runtime.block_on(async {
            let head = self
                .client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await;
            match head {
                Ok(resp) => Ok(EntryInfo::file(
                    resp.content_length().unwrap_or(0).max(0) as u64
                )),
                Err(err) => {
                    let not_found = err
                        .as_service_error()
                        .map(|e| e.is_not_found())
                        .unwrap_or(false);
                    if !not_found {
                        return Err(op_failed(
                            "stat",
                            &format!("/{bucket}/{key}"),
                            DisplayErrorContext(&err),
                        ));
                    }
                    // No object under that key; probe for a common prefix.
                    let probe = self
                        .client
                        .list_objects_v2()
                        .bucket(bucket)
                        .prefix(format!("{key}/"))
                        .max_keys(1)
                        .send()
                        .await
                        .map_err(|e| {
                            op_failed("stat", &format!("/{bucket}/{key}"), DisplayErrorContext(&e))
                        })?;
                    if probe.key_count().unwrap_or(0) > 0 {
                        Ok(EntryInfo::directory())
                    } else {
                        Err(FsError::NotFound(format!("/{bucket}/{key}")))
                    }
                }
            }
        })
    }
}

impl RemoteFilesystem for S3Filesystem {
    fn list(&self, path: &str) -> Result<Vec<String>, FsError> {
        let path = normalize(path);
        match split_bucket(&path) {
            None => self.list_buckets(),
            Some((bucket, key)) => self.list_objects(bucket, key),
        }
    }

    fn stat(&self, path: &str) -> Result<EntryInfo, FsError> {
        let path = normalize(path);
        match split_bucket(&path) {
            // The root is always a directory.
            None => Ok(EntryInfo::directory()),
            Some((bucket, "")) => self.runtime.block_on(async {
                self.client
                    .head_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(|e| op_failed("stat", &path, DisplayErrorContext(&e)))?;
                Ok(EntryInfo::directory())
            }),
            Some((bucket, key)) => self.stat_object(bucket, key),
        }
    }

    fn fetch(&self, remote_path: &str, local_path: &Path) -> Result<(), FsError> {
        let path = normalize(remote_path);
        let (bucket, key) = split_bucket(&path)
            .filter(|(_, key)| !key.is_empty())
            .ok_or_else(|| FsError::OperationFailed(format!("not an object path: {path}")))?;

        self.runtime.block_on(async {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    let not_found = e
                        .as_service_error()
                        .map(|e| e.is_no_such_key())
                        .unwrap_or(false);
                    if not_found {
                        FsError::NotFound(path.clone())
                    } else {
                        op_failed("fetch", &path, DisplayErrorContext(&e))
                    }
                })?;

            let mut local = std::fs::File::create(local_path)?;
            let mut body = resp.body;
            while let Some(chunk) = body
                .try_next()
                .await
                .map_err(|e| op_failed("fetch", &path, e))?
            {
                local.write_all(&chunk)?;
            }
            local.flush()?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bucket_root_is_none() {
        assert_eq!(split_bucket("/"), None);
    }

    #[test]
    fn split_bucket_bare_bucket() {
        assert_eq!(split_bucket("/my-bucket"), Some(("my-bucket", "")));
    }

    #[test]
    fn split_bucket_with_key() {
        assert_eq!(
            split_bucket("/my-bucket/data/vol.zarr"),
            Some(("my-bucket", "data/vol.zarr"))
        );
    }
}
