use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single uploaded file. Flat table, no relations; rows are created once,
/// read many times, and mutated only by the download-accounting update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// User-supplied name, untrusted. Display and download hint only.
    pub original_name: String,
    /// Server-generated unique name on the storage backend. Never exposed.
    #[sea_orm(unique)]
    pub stored_name: String,
    #[sea_orm(unique)]
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub created_at: DateTimeUtc,
    pub last_downloaded_at: Option<DateTimeUtc>,
    pub download_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
