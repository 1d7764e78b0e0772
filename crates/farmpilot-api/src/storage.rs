use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Subdirectory per resource kind under the upload root.
pub const AVATARS: &str = "avatars";
pub const COMMUNITY_IMAGES: &str = "community_images";
pub const MARKET_IMAGES: &str = "market_images";

/// On-disk storage for uploaded images. Files are stored under a generated
/// collision-free name; the original name only contributes its extension.
#[derive(Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub async fn new(root: PathBuf) -> Result<Self> {
        for kind in [AVATARS, COMMUNITY_IMAGES, MARKET_IMAGES] {
            fs::create_dir_all(root.join(kind)).await?;
        }
        info!("Upload storage at {}", root.display());
        Ok(Self { root })
    }

    fn file_path(&self, kind: &str, filename: &str) -> PathBuf {
        self.root.join(kind).join(filename)
    }

    /// Write `bytes` under a fresh `{uuid}{ext}` name and return that name.
    pub async fn save(&self, kind: &str, original_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let filename = format!("{}{}", Uuid::new_v4(), ext);

        fs::write(self.file_path(kind, &filename), bytes).await?;
        Ok(filename)
    }

    /// Read a stored file back; `None` when it is missing on disk.
    pub async fn read(&self, kind: &str, filename: &str) -> Option<Vec<u8>> {
        fs::read(self.file_path(kind, filename)).await.ok()
    }

    /// Best-effort removal, used when an avatar is replaced.
    pub async fn remove(&self, kind: &str, filename: &str) {
        if let Err(e) = fs::remove_file(self.file_path(kind, filename)).await {
            warn!("Failed to remove {}/{}: {}", kind, filename, e);
        }
    }
}

/// Content type for serving a stored image, keyed off the preserved
/// extension; unknown extensions fall back to an opaque blob.
pub fn content_type(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_generates_unique_names_preserving_extension() {
        let dir = std::env::temp_dir().join(format!("farmpilot-test-{}", Uuid::new_v4()));
        let storage = Storage::new(dir.clone()).await.unwrap();

        let a = storage.save(AVATARS, "me.PNG", b"one").await.unwrap();
        let b = storage.save(AVATARS, "me.PNG", b"two").await.unwrap();

        assert_ne!(a, b);
        assert!(a.ends_with(".PNG"));
        assert_eq!(storage.read(AVATARS, &a).await.unwrap(), b"one");
        assert!(storage.read(AVATARS, "missing.png").await.is_none());

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.png"), "image/png");
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a"), "application/octet-stream");
    }
}
