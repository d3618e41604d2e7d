use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

/// Public URL prefix stored files are served under.
pub const PUBLIC_PREFIX: &str = "uploads";

/// Handle to the local upload directory. Cheap to clone; shared with
/// handlers through `AppState`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens the store, creating the directory if it does not exist.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("creating upload directory {}", root.display()))?;
        info!("Upload directory ready at {}", root.display());
        Ok(FileStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under a fresh uuid-prefixed name and returns the
    /// public `uploads/...` path recorded in the database.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let disk_path = self.root.join(&name);
        tokio::fs::write(&disk_path, bytes)
            .await
            .with_context(|| format!("writing {}", disk_path.display()))?;
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }

    /// Removes a stored file. A missing file counts as removed.
    pub async fn remove(&self, stored_path: &str) -> Result<()> {
        let disk_path = self.disk_path(stored_path);
        match tokio::fs::remove_file(&disk_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing {}", disk_path.display()))
            }
        }
    }

    /// Best-effort removal for compensating cleanups: failures are logged
    /// and swallowed.
    pub async fn remove_best_effort(&self, stored_path: &str) {
        if let Err(e) = self.remove(stored_path).await {
            warn!("Failed to remove stored file {stored_path}: {e:#}");
        }
    }

    /// Maps a recorded `uploads/...` path back to its on-disk location.
    /// Only the final path component is honored.
    fn disk_path(&self, stored_path: &str) -> PathBuf {
        let name = Path::new(stored_path)
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_default();
        self.root.join(name)
    }
}

/// Strips any directory components from a client-supplied filename.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::init(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_save_writes_bytes_and_returns_public_path() {
        let (_dir, store) = store().await;
        let path = store.save("resume.pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.starts_with("uploads/"));
        assert!(path.ends_with("-resume.pdf"));

        let on_disk = store.root().join(path.strip_prefix("uploads/").unwrap());
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_save_generates_distinct_names_for_same_file() {
        let (_dir, store) = store().await;
        let a = store.save("scan.png", b"a").await.unwrap();
        let b = store.save("scan.png", b"b").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_remove_deletes_the_file() {
        let (_dir, store) = store().await;
        let path = store.save("doc.pdf", b"x").await.unwrap();
        store.remove(&path).await.unwrap();

        let on_disk = store.root().join(path.strip_prefix("uploads/").unwrap());
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let (_dir, store) = store().await;
        store.remove("uploads/never-written.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_save_strips_directory_components() {
        let (_dir, store) = store().await;
        let path = store.save("../../etc/passwd.png", b"x").await.unwrap();
        assert!(path.ends_with("-passwd.png"));
        // nothing escaped the store root
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 1);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("offer.pdf"), "offer.pdf");
        assert_eq!(sanitize_file_name("a/b/c.png"), "c.png");
        assert_eq!(sanitize_file_name("a\\b\\c.jpg"), "c.jpg");
        assert_eq!(sanitize_file_name("trailing/"), "upload");
    }
}
