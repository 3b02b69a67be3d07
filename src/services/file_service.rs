use crate::config::AppConfig;
use crate::entities::{files, prelude::*};
use crate::error::AppError;
use crate::services::storage::{StorageBackend, StorageError};
use crate::utils::naming::generate_stored_name;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Bounded retries for the timestamp+entropy naming scheme. A collision is
/// already astronomically unlikely; exhausting the attempts is a hard error.
const MAX_NAME_ATTEMPTS: u32 = 5;

pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageBackend>,
    config: AppConfig,
}

impl FileService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageBackend>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    /// Streams an upload to the storage backend under a fresh unique name,
    /// then records its metadata. Bytes are written first; if the insert
    /// fails the stored bytes are deleted best-effort and the error is
    /// surfaced to the caller.
    pub async fn store_upload(
        &self,
        original_name: &str,
        mime_type: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<files::Model, AppError> {
        let stored_name = self.next_stored_name(original_name).await?;

        let written = self
            .storage
            .write(&stored_name, reader, self.config.max_file_size as u64)
            .await
            .map_err(|e| match e {
                StorageError::TooLarge { limit } => AppError::BadRequest(format!(
                    "File exceeds maximum allowed size of {} bytes ({} MB)",
                    limit,
                    limit / 1024 / 1024
                )),
                StorageError::Io(e) => {
                    tracing::error!("Storage write failed for {}: {}", stored_name, e);
                    AppError::Internal(format!("Storage write failed: {}", e))
                }
            })?;

        let record = files::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            original_name: Set(original_name.to_string()),
            stored_name: Set(stored_name.clone()),
            storage_path: Set(written.storage_path.clone()),
            mime_type: Set(mime_type.to_string()),
            size_bytes: Set(written.size_bytes as i64),
            created_at: Set(Utc::now()),
            last_downloaded_at: Set(None),
            download_count: Set(0),
        };

        match record.insert(&self.db).await {
            Ok(model) => {
                tracing::info!(file_id = %model.id, "New file record created");
                Ok(model)
            }
            Err(e) => {
                tracing::error!("Failed to create file record for {}: {}", stored_name, e);
                // Compensating cleanup; disk and database are not transactional
                if let Err(del_err) = self.storage.delete(&written.storage_path).await {
                    tracing::error!(
                        "Orphaned stored bytes at {}: cleanup failed: {}",
                        written.storage_path,
                        del_err
                    );
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// Primary-key lookup for retrieval. `None` means unknown identifier.
    pub async fn get_for_download(&self, id: &str) -> Result<Option<files::Model>, AppError> {
        let record = Files::find_by_id(id).one(&self.db).await?;
        Ok(record)
    }

    /// Bumps download_count and stamps last_downloaded_at in one atomic
    /// UPDATE. Callers treat this as fire-and-forget; errors are theirs to
    /// log, not to surface.
    pub async fn record_download(&self, id: &str) -> Result<(), AppError> {
        let result = Files::update_many()
            .col_expr(
                files::Column::DownloadCount,
                Expr::col(files::Column::DownloadCount).add(1),
            )
            .col_expr(
                files::Column::LastDownloadedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(files::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(file_id = %id, "Download stats update matched no record");
        }

        Ok(())
    }

    /// Synthesizes a stored name and probes the backend for a collision,
    /// failing fast if the scheme is somehow exhausted.
    async fn next_stored_name(&self, original_name: &str) -> Result<String, AppError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = generate_stored_name(original_name);

            let taken = self.storage.exists(&candidate).await.map_err(|e| {
                AppError::Internal(format!("Storage probe failed: {}", e))
            })?;

            if !taken {
                return Ok(candidate);
            }

            tracing::warn!("Stored name collision on {}, regenerating", candidate);
        }

        Err(AppError::Internal(
            "Could not generate a unique storage name".to_string(),
        ))
    }
}
