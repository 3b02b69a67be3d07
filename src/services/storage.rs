use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Read/write buffer for streaming uploads and downloads
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File exceeds maximum allowed size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct WrittenFile {
    pub storage_path: String,
    pub size_bytes: u64,
}

pub struct StoredObject {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub size_bytes: u64,
}

/// Durable byte storage addressed by server-generated names.
///
/// Writes are append-only per unique name; the naming scheme guarantees no
/// two requests target the same name, so implementations need no path-level
/// locking.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Streams `reader` to durable storage under `stored_name`, enforcing
    /// `max_size` while bytes are in flight. A partial write must not
    /// survive a failed call.
    async fn write(
        &self,
        stored_name: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        max_size: u64,
    ) -> Result<WrittenFile, StorageError>;

    /// Opens a previously written file for streaming out.
    async fn open(&self, storage_path: &str) -> Result<StoredObject, StorageError>;

    /// Removes a stored file. Used by compensating cleanup only.
    async fn delete(&self, storage_path: &str) -> Result<(), StorageError>;

    /// Collision probe for name synthesis.
    async fn exists(&self, stored_name: &str) -> Result<bool, StorageError>;
}

/// Filesystem-backed storage rooted at the configured upload directory.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }
}

#[async_trait]
impl StorageBackend for LocalDiskStorage {
    async fn write(
        &self,
        stored_name: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        max_size: u64,
    ) -> Result<WrittenFile, StorageError> {
        let path = self.path_for(stored_name);
        let mut file = fs::File::create(&path).await?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&path).await;
                    return Err(StorageError::Io(e));
                }
            };

            total += n as u64;
            if total > max_size {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(StorageError::TooLarge { limit: max_size });
            }

            if let Err(e) = file.write_all(&buffer[..n]).await {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(StorageError::Io(e));
            }
        }

        file.flush().await?;

        Ok(WrittenFile {
            storage_path: path.to_string_lossy().into_owned(),
            size_bytes: total,
        })
    }

    async fn open(&self, storage_path: &str) -> Result<StoredObject, StorageError> {
        let file = fs::File::open(storage_path).await?;
        let size_bytes = file.metadata().await?.len();

        Ok(StoredObject {
            reader: Box::new(file),
            size_bytes,
        })
    }

    async fn delete(&self, storage_path: &str) -> Result<(), StorageError> {
        fs::remove_file(storage_path).await?;
        Ok(())
    }

    async fn exists(&self, stored_name: &str) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.path_for(stored_name)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_path_buf());

        let mut input: &[u8] = b"hello storage";
        let written = storage.write("file-1-000000001.txt", &mut input, 1024).await.unwrap();
        assert_eq!(written.size_bytes, 13);

        let mut object = storage.open(&written.storage_path).await.unwrap();
        assert_eq!(object.size_bytes, 13);

        let mut contents = Vec::new();
        object.reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"hello storage");
    }

    #[tokio::test]
    async fn test_write_enforces_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_path_buf());

        let payload = vec![0u8; 2048];
        let mut input: &[u8] = &payload;
        let err = storage
            .write("file-1-000000002.bin", &mut input, 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::TooLarge { limit: 1024 }));

        // The partial file must not survive
        assert!(!storage.exists("file-1-000000002.bin").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_path_buf());

        let mut input: &[u8] = b"x";
        let written = storage.write("file-1-000000003", &mut input, 16).await.unwrap();

        storage.delete(&written.storage_path).await.unwrap();
        assert!(!storage.exists("file-1-000000003").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_probe() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path().to_path_buf());

        assert!(!storage.exists("file-9-999999999.pdf").await.unwrap());
        let mut input: &[u8] = b"y";
        storage.write("file-9-999999999.pdf", &mut input, 16).await.unwrap();
        assert!(storage.exists("file-9-999999999.pdf").await.unwrap());
    }
}
