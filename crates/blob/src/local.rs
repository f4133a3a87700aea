use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::BlobError;
use crate::store::BlobStore;

/// Local-filesystem [`BlobStore`].
///
/// Every blob is one file directly under the root directory. Stored
/// names are generated, so distinct-name filesystem semantics are all
/// the concurrency control `store` needs.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open the store, creating the root directory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Storage`] if the root cannot be created,
    /// a startup-time configuration error rather than a request-time
    /// one.
    pub async fn new(config: &StorageConfig) -> Result<Self, BlobError> {
        tokio::fs::create_dir_all(&config.root)
            .await
            .map_err(|e| {
                BlobError::Storage(format!(
                    "could not initialize storage at {}: {e}",
                    config.root.display()
                ))
            })?;
        Ok(Self {
            root: config.root.clone(),
        })
    }

    /// Resolve a stored name under the root, rejecting anything that is
    /// not a single plain file name. This is what keeps a malicious
    /// name like `../../etc/passwd` inside the root.
    fn resolve(&self, stored_name: &str) -> Result<PathBuf, BlobError> {
        if stored_name.is_empty() || stored_name.contains('/') || stored_name.contains('\\') {
            return Err(BlobError::InvalidName(stored_name.to_owned()));
        }
        let mut components = Path::new(stored_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(stored_name)),
            _ => Err(BlobError::InvalidName(stored_name.to_owned())),
        }
    }
}

/// Generate a collision-resistant stored name: a random 128-bit
/// identifier plus the original name's extension.
fn generate_name(original_name: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension_of(original_name))
}

/// The extension of the original name's file-name component, dot
/// included; empty when there is none or when the name starts with its
/// only dot.
fn extension_of(original_name: &str) -> String {
    let name = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_owned(),
        _ => String::new(),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, data: Bytes, original_name: &str) -> Result<String, BlobError> {
        if data.is_empty() {
            return Err(BlobError::Empty);
        }

        let stored_name = generate_name(original_name);
        let destination = self.root.join(&stored_name);
        tokio::fs::write(&destination, &data)
            .await
            .map_err(|e| BlobError::Storage(format!("failed to store blob: {e}")))?;

        tracing::debug!(name = %stored_name, bytes = data.len(), "blob stored");
        Ok(stored_name)
    }

    async fn load(&self, stored_name: &str) -> Result<Bytes, BlobError> {
        let path = self.resolve(stored_name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                Err(BlobError::NotFound(stored_name.to_owned()))
            }
            Err(e) => Err(BlobError::Storage(format!("failed to read blob: {e}"))),
        }
    }

    async fn delete(&self, stored_name: &str) -> Result<(), BlobError> {
        let path = self.resolve(stored_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Storage(format!("failed to delete blob: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bytes::Bytes;

    use super::{LocalBlobStore, extension_of, generate_name};
    use crate::config::StorageConfig;
    use crate::error::BlobError;
    use crate::store::BlobStore;

    async fn store_in(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(&StorageConfig::new(dir.path()))
            .await
            .unwrap()
    }

    #[test]
    fn extension_derivation() {
        assert_eq!(extension_of("a.png"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".gitignore"), "");
        assert_eq!(extension_of("dir/photo.jpeg"), ".jpeg");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn generated_names_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_name("photo.png")));
        }
        assert!(seen.iter().all(|name: &String| name.ends_with(".png")));
    }

    #[tokio::test]
    async fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let name = store
            .store(Bytes::from_static(b"hello"), "greeting.txt")
            .await
            .unwrap();
        assert!(name.ends_with(".txt"));

        let data = store.load(&name).await.unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store.store(Bytes::new(), "empty.bin").await;
        assert!(matches!(result, Err(BlobError::Empty)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        for hostile in ["../../etc/passwd", "..", "a/b.txt", "..\\secrets", ""] {
            let result = store.load(hostile).await;
            assert!(
                matches!(result, Err(BlobError::InvalidName(_))),
                "{hostile:?} must be rejected"
            );
        }
    }

    #[tokio::test]
    async fn load_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let result = store.load("no-such-blob.bin").await;
        assert!(matches!(result, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.delete("already-gone.png").await.unwrap();

        let name = store
            .store(Bytes::from_static(b"x"), "x.png")
            .await
            .unwrap();
        store.delete(&name).await.unwrap();
        assert!(matches!(
            store.load(&name).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reopening_an_existing_root_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let _first = store_in(&dir).await;
        let _second = store_in(&dir).await;
    }
}
