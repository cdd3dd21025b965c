//! Object storage for alert images.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    fn public_url(&self, key: &str) -> String;
}

/// Extensions served back as images. Anything else (html, svg, ...) would be
/// served as active content from our own origin.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Random key carrying the file's lowercased image extension, or `None` when
/// the name has no allowed image extension. Collisions are possible in
/// principle and not checked for.
pub fn object_key(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();

    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(format!("{}.{}", Uuid::new_v4(), ext))
}

/// Stores objects as files under `root`; they are served under `public_base`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub async fn new(root: impl Into<PathBuf>, public_base: &str) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create storage dir {}", root.display()))?;

        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("invalid object key '{}'", key);
        }

        let path = self.root.join(key);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("write {}", path.display()))?;

        info!("Stored image {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}
