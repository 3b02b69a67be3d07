use std::env;
use std::path::PathBuf;

/// Runtime configuration for the upload service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the HTTP server binds to (default: 3000)
    pub port: u16,

    /// Database connection string (default: local SQLite file)
    pub database_url: String,

    /// Directory uploaded files are written to (default: "uploads")
    pub upload_dir: PathBuf,

    /// Base URL download links are built from (default: "http://localhost:<port>")
    pub public_base_url: String,

    /// Maximum upload size in bytes (default: 10 MiB)
    pub max_file_size: usize,

    /// Declared MIME types accepted for upload
    pub allowed_mime_types: Vec<String>,

    /// Retention window in days. Read into config for parity with the
    /// deployment environment; no eviction sweep consumes it yet.
    pub expiration_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite://files.db?mode=rwc".to_string(),
            upload_dir: PathBuf::from("uploads"),
            public_base_url: "http://localhost:3000".to_string(),
            max_file_size: 10 * 1024 * 1024, // 10 MiB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "application/pdf".to_string(),
                "application/zip".to_string(),
            ],
            expiration_days: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.port);

        Self {
            port,

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            upload_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_mime_types),

            expiration_days: env::var("FILE_EXPIRATION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.expiration_days),
        }
    }

    /// Download link for a stored file id
    pub fn download_link(&self, id: &str) -> String {
        format!(
            "{}/api/files/download/{}",
            self.public_base_url.trim_end_matches('/'),
            id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.allowed_mime_types.len(), 4);
        assert!(
            config
                .allowed_mime_types
                .contains(&"application/pdf".to_string())
        );
        assert_eq!(config.expiration_days, 30);
    }

    #[test]
    fn test_download_link() {
        let config = AppConfig {
            public_base_url: "http://localhost:3000/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.download_link("abc-123"),
            "http://localhost:3000/api/files/download/abc-123"
        );
    }
}
