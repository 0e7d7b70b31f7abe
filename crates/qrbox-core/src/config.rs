//! Configuration module
//!
//! All configuration comes from the environment. `Config::from_env` applies
//! defaults for everything except `DATABASE_URL`, which is required.

use std::env;

const DEFAULT_PORT: u16 = 10000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_CONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 20;
const DEFAULT_DETECTION_MAX_WORKERS: usize = 4;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Connection attempts before startup gives up. Backoff doubles between attempts.
    pub db_connect_attempts: u32,
    pub upload_dir: String,
    /// Base URL used when building public links to stored files.
    pub public_base_url: String,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    pub detection_max_workers: usize,
    pub shutdown_grace_seconds: u64,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let server_port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "jpg,jpeg,png,gif,webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/png,image/gif,image/webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));

        Ok(Self {
            server_port,
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_TIMEOUT_SECS),
            db_connect_attempts: env::var("DB_CONNECT_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_CONNECT_ATTEMPTS),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base_url,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions,
            allowed_content_types,
            detection_max_workers: env::var("DETECTION_MAX_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DETECTION_MAX_WORKERS),
            shutdown_grace_seconds: env::var("SHUTDOWN_GRACE_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
            cors_origins,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_detection() {
        let mut config = Config {
            server_port: DEFAULT_PORT,
            database_url: "postgres://localhost/qrbox".to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            db_timeout_seconds: DEFAULT_DB_TIMEOUT_SECS,
            db_connect_attempts: DEFAULT_DB_CONNECT_ATTEMPTS,
            upload_dir: "uploads".to_string(),
            public_base_url: "http://localhost:10000".to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: vec!["png".to_string()],
            allowed_content_types: vec!["image/png".to_string()],
            detection_max_workers: DEFAULT_DETECTION_MAX_WORKERS,
            shutdown_grace_seconds: DEFAULT_SHUTDOWN_GRACE_SECS,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
        };
        assert!(!config.is_production());

        config.environment = "Production".to_string();
        assert!(config.is_production());

        config.environment = "prod".to_string();
        assert!(config.is_production());
    }
}
