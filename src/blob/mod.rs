// Blob store for part photos: file-backed binary storage with verified writes.
//
// Keys are forward-slash relative paths ("parts/<ts>_<seq>_<name>"). A blob
// is only considered stored once the bytes are on disk, fsynced, and the
// read-back hash matches what was written.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ShopTrackError};

/// Binary object storage seam. `upload` resolves when the blob is fully
/// stored; `download_url` resolves the stable retrieval URL for a stored key.
pub trait BlobStore: Send + Sync {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<()>;
    fn download_url(&self, path: &str) -> Result<String>;
}

/// File-backed blob store rooted at the store's uploads folder.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            root: uploads_root.into(),
        }
    }

    /// Blob store for an initialized store root (`<root>/.shoptrack/uploads`).
    pub fn open(store_root: &Path) -> Self {
        Self::new(crate::store::get_uploads_path(store_root))
    }

    /// Resolve a key to an absolute path, rejecting traversal outside the root.
    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if path.is_empty() || escapes {
            return Err(ShopTrackError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FileBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let dest = self.full_path(path)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(&dest)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        // Read back and verify before reporting success
        let written = fs::read(&dest)?;
        if written.len() != bytes.len() || blake3::hash(&written) != blake3::hash(bytes) {
            return Err(ShopTrackError::Blob(format!(
                "verification failed after writing {}",
                path
            )));
        }

        Ok(())
    }

    fn download_url(&self, path: &str) -> Result<String> {
        let dest = self.full_path(path)?;
        if !dest.exists() {
            return Err(ShopTrackError::Blob(format!("no blob stored at {}", path)));
        }
        Ok(format!("file://{}", dest.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn upload_stores_bytes_and_url_points_at_them() {
        let tmp = TempDir::new().unwrap();
        let blobs = FileBlobStore::new(tmp.path());

        let bytes = b"jpeg bytes go here";
        blobs.upload("parts/1722_0_pad.jpg", bytes).unwrap();

        let url = blobs.download_url("parts/1722_0_pad.jpg").unwrap();
        let stored_path = url.strip_prefix("file://").unwrap();
        assert_eq!(fs::read(stored_path).unwrap(), bytes);
    }

    #[test]
    fn download_url_requires_an_uploaded_blob() {
        let tmp = TempDir::new().unwrap();
        let blobs = FileBlobStore::new(tmp.path());

        let missing = blobs.download_url("parts/never_uploaded.jpg");
        assert!(matches!(missing, Err(ShopTrackError::Blob(_))));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let blobs = FileBlobStore::new(tmp.path());

        assert!(matches!(
            blobs.upload("../outside.jpg", b"x"),
            Err(ShopTrackError::InvalidPath(_))
        ));
        assert!(matches!(
            blobs.upload("/etc/hosts", b"x"),
            Err(ShopTrackError::InvalidPath(_))
        ));
    }
}
