pub mod config;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::storage::StorageBackend;
use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::files::upload_file, handlers::files::download_file),
    components(schemas(handlers::files::UploadResponse)),
    tags(
        (name = "files", description = "File upload and download endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageBackend>,
    pub file_service: Arc<FileService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/files/upload", post(handlers::files::upload_file))
        .route("/api/files/download/:id", get(handlers::files::download_file))
        .with_state(state)
}
