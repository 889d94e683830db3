//! Filesystem object storage
//!
//! Objects live under `<root>/storage/<bucket>/<path>`. Public buckets
//! resolve to plain URLs; private buckets hand out signed URLs whose token is
//! `HMAC-SHA256(secret, bucket "/" path ":" expires)` in hex. A private
//! bucket refuses to start without a secret.

use async_trait::async_trait;
use chrono::Utc;
use gatepass_common::config::StorageConfig;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::types::{ObjectStorage, StorageError};

type HmacSha256 = Hmac<Sha256>;

/// Strip leading slashes and a leading `<bucket>/` from a stored path
pub fn normalize_object_path(bucket: &str, raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('/');
    let prefix = format!("{}/", bucket);
    trimmed
        .strip_prefix(prefix.as_str())
        .unwrap_or(trimmed)
        .to_string()
}

/// Absolute references need no resolution
pub fn is_absolute_reference(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

/// Content type guessed from a file extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
    bucket: String,
    base_url: String,
    public: bool,
    /// Always present for private buckets
    signing_key: Option<Vec<u8>>,
    signed_url_ttl_secs: u64,
}

impl LocalBucket {
    pub fn new(
        storage_root: &Path,
        base_url: &str,
        config: &StorageConfig,
    ) -> Result<Self, StorageError> {
        let signing_key = config
            .signing_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
            .map(|secret| secret.as_bytes().to_vec());
        if !config.public && signing_key.is_none() {
            return Err(StorageError::MissingSigningSecret(config.bucket.clone()));
        }

        Ok(Self {
            root: storage_root.join(&config.bucket),
            bucket: config.bucket.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            public: config.public,
            signing_key,
            signed_url_ttl_secs: config.signed_url_ttl_secs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Map an object path onto the bucket directory, refusing escapes
    fn object_file(&self, path: &str) -> Result<PathBuf, StorageError> {
        let normalized = normalize_object_path(&self.bucket, path);
        if normalized.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let relative = Path::new(&normalized);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn mac(&self, path: &str, expires: i64) -> Option<HmacSha256> {
        let key = self.signing_key.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(key).ok()?;
        mac.update(self.bucket.as_bytes());
        mac.update(b"/");
        mac.update(path.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Some(mac)
    }

    /// Signed URL for `path`, valid until `now + ttl`; `None` without a key
    pub fn signed_url(&self, path: &str, now: i64) -> Option<String> {
        let expires = now + self.signed_url_ttl_secs as i64;
        let token = hex::encode(self.mac(path, expires)?.finalize().into_bytes());
        Some(format!(
            "{}/storage/{}/{}?expires={}&token={}",
            self.base_url, self.bucket, path, expires, token
        ))
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/{}/{}", self.base_url, self.bucket, path)
    }

    /// Check a signed-URL token; public buckets accept every request
    pub fn verify(&self, path: &str, expires: Option<i64>, token: Option<&str>, now: i64) -> bool {
        if self.public {
            return true;
        }
        let (Some(expires), Some(token)) = (expires, token) else {
            return false;
        };
        if expires < now {
            return false;
        }
        let (Some(mac), Ok(tag)) = (self.mac(path, expires), hex::decode(token)) else {
            return false;
        };
        mac.verify_slice(&tag).is_ok()
    }

    /// Read an object and its content type
    pub async fn read(&self, path: &str) -> Result<(Vec<u8>, &'static str), StorageError> {
        let file = self.object_file(path)?;
        match fs::read(&file).await {
            Ok(bytes) => Ok((bytes, content_type_for(path))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let file = self.object_file(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut handle = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file)
            .await
        {
            Ok(handle) => handle,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        handle.write_all(bytes).await?;
        handle.flush().await?;

        info!(path = %path, bytes = bytes.len(), content_type = %content_type, "Object stored");
        Ok(())
    }

    fn resolve_url(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if is_absolute_reference(reference) {
            return Some(reference.to_string());
        }

        let path = normalize_object_path(&self.bucket, reference);
        if path.is_empty() {
            return None;
        }
        debug!(path = %path, public = self.public, "Resolving object URL");
        if self.public {
            Some(self.public_url(&path))
        } else {
            self.signed_url(&path, Utc::now().timestamp())
        }
    }
}
