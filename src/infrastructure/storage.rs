use crate::services::storage::LocalDiskStorage;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Prepares the upload directory and hands back the disk-backed storage
/// service the rest of the application shares.
pub async fn setup_storage(upload_dir: &Path) -> anyhow::Result<Arc<LocalDiskStorage>> {
    tokio::fs::create_dir_all(upload_dir).await?;

    info!("📁 Storage directory: {}", upload_dir.display());

    Ok(Arc::new(LocalDiskStorage::new(upload_dir.to_path_buf())))
}
