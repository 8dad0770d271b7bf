use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix under which stored avatars are served, and the prefix of the
/// path recorded on the user.
pub const PUBLIC_PREFIX: &str = "images";

pub fn public_path(name: &str) -> String {
    format!("{}/{}", PUBLIC_PREFIX, name)
}

/// An upload that has been written but is not yet visible under its name.
#[derive(Debug)]
pub struct StagedAvatar {
    name: String,
    key: String,
}

impl StagedAvatar {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend handle of the staged bytes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path the avatar will be served under once published.
    pub fn public_path(&self) -> String {
        public_path(&self.name)
    }
}

/// Two-phase avatar store: `stage` never touches a published file, so the
/// caller can link the user first and only then `publish` (or `discard`).
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    async fn stage(&self, name: &str, body: Bytes) -> anyhow::Result<StagedAvatar>;
    /// Move the staged bytes into place, replacing an existing file of the same name.
    async fn publish(&self, staged: StagedAvatar) -> anyhow::Result<String>;
    async fn discard(&self, staged: StagedAvatar) -> anyhow::Result<()>;
}

/// Avatars on the local filesystem. Uploads are staged in a directory that is
/// not served and renamed into the public directory, so readers never see a
/// partial image. Both directories must live on the same filesystem.
#[derive(Clone)]
pub struct LocalAvatarStorage {
    dir: PathBuf,
    staging: PathBuf,
}

impl LocalAvatarStorage {
    pub fn new(dir: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staging: staging.into(),
        }
    }
}

#[async_trait]
impl AvatarStorage for LocalAvatarStorage {
    async fn stage(&self, name: &str, body: Bytes) -> anyhow::Result<StagedAvatar> {
        tokio::fs::create_dir_all(&self.staging)
            .await
            .with_context(|| format!("create staging dir {}", self.staging.display()))?;

        let key = format!("{}.tmp", Uuid::new_v4());
        let tmp = self.staging.join(&key);
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;

        debug!(path = %tmp.display(), bytes = body.len(), "avatar staged");
        Ok(StagedAvatar::new(name, key))
    }

    async fn publish(&self, staged: StagedAvatar) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create avatar dir {}", self.dir.display()))?;

        let tmp = self.staging.join(staged.key());
        let target = self.dir.join(staged.name());
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            if let Err(rm) = tokio::fs::remove_file(&tmp).await {
                warn!(error = %rm, path = %tmp.display(), "staged avatar not removed");
            }
            return Err(e).with_context(|| format!("rename into {}", target.display()));
        }

        debug!(path = %target.display(), "avatar published");
        Ok(staged.public_path())
    }

    async fn discard(&self, staged: StagedAvatar) -> anyhow::Result<()> {
        let tmp = self.staging.join(staged.key());
        tokio::fs::remove_file(&tmp)
            .await
            .with_context(|| format!("remove {}", tmp.display()))?;
        Ok(())
    }
}

/// Sniff the image type from magic bytes; only JPEG and PNG are recognised.
pub fn detect_image_type(body: &[u8]) -> Option<&'static str> {
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    if body.starts_with(JPEG) {
        Some("image/jpeg")
    } else if body.starts_with(PNG) {
        Some("image/png")
    } else {
        None
    }
}
