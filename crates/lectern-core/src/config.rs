//! Configuration module
//!
//! Configuration for the publication pipeline: course store connection,
//! asset store backend and promotion behaviour. Values come from the
//! environment (and a `.env` file when present).

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ASSET_PROMOTION_CONCURRENCY, DEFAULT_ASSET_ROOT, DEFAULT_SIGNED_URL_TTL_SECS,
};
use crate::storage_types::AssetStoreBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const CLOUDINARY_API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Base configuration shared by every entry point
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// `json` switches the tracing subscriber to JSON lines.
    pub log_format: String,
}

/// Publication pipeline configuration
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    pub base: BaseConfig,
    // Asset store configuration
    pub asset_store_backend: Option<AssetStoreBackend>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_api_base_url: String,
    pub local_asset_path: Option<String>,
    pub local_asset_base_url: Option<String>,
    // Promotion behaviour
    pub asset_root_folder: String,
    pub signed_url_ttl_secs: u64,
    pub asset_promotion_concurrency: usize,
    pub publish_timeout_secs: Option<u64>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PublisherConfig>);

impl Config {
    fn as_publisher(&self) -> &PublisherConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_publisher().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PublisherConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_publisher().validate()
    }

    pub fn environment(&self) -> &str {
        &self.as_publisher().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.as_publisher().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_publisher().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_publisher().base.db_timeout_seconds
    }

    pub fn log_format(&self) -> &str {
        &self.as_publisher().base.log_format
    }

    pub fn asset_store_backend(&self) -> Option<AssetStoreBackend> {
        self.as_publisher().asset_store_backend
    }

    pub fn cloudinary_cloud_name(&self) -> Option<&str> {
        self.as_publisher().cloudinary_cloud_name.as_deref()
    }

    pub fn cloudinary_api_key(&self) -> Option<&str> {
        self.as_publisher().cloudinary_api_key.as_deref()
    }

    pub fn cloudinary_api_secret(&self) -> Option<&str> {
        self.as_publisher().cloudinary_api_secret.as_deref()
    }

    pub fn cloudinary_api_base_url(&self) -> &str {
        &self.as_publisher().cloudinary_api_base_url
    }

    pub fn local_asset_path(&self) -> Option<&str> {
        self.as_publisher().local_asset_path.as_deref()
    }

    pub fn local_asset_base_url(&self) -> Option<&str> {
        self.as_publisher().local_asset_base_url.as_deref()
    }

    pub fn asset_root_folder(&self) -> &str {
        &self.as_publisher().asset_root_folder
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.as_publisher().signed_url_ttl_secs)
    }

    pub fn asset_promotion_concurrency(&self) -> usize {
        self.as_publisher().asset_promotion_concurrency
    }

    pub fn publish_timeout(&self) -> Option<Duration> {
        self.as_publisher()
            .publish_timeout_secs
            .map(Duration::from_secs)
    }
}

impl PublisherConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase(),
        };

        let asset_store_backend = match env::var("ASSET_STORE_BACKEND") {
            Ok(value) => Some(value.parse::<AssetStoreBackend>()?),
            Err(_) => None,
        };

        let config = PublisherConfig {
            base,
            asset_store_backend,
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .ok()
                .filter(|s| !s.is_empty()),
            cloudinary_api_key: env::var("CLOUDINARY_API_KEY").ok().filter(|s| !s.is_empty()),
            cloudinary_api_secret: env::var("CLOUDINARY_API_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            cloudinary_api_base_url: env::var("CLOUDINARY_API_BASE_URL")
                .unwrap_or_else(|_| CLOUDINARY_API_BASE_URL.to_string()),
            local_asset_path: env::var("LOCAL_ASSET_PATH").ok(),
            local_asset_base_url: env::var("LOCAL_ASSET_BASE_URL").ok(),
            asset_root_folder: env::var("ASSET_ROOT_FOLDER")
                .ok()
                .map(|s| s.trim_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ASSET_ROOT.to_string()),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            asset_promotion_concurrency: env::var("ASSET_PROMOTION_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_ASSET_PROMOTION_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(DEFAULT_ASSET_PROMOTION_CONCURRENCY),
            publish_timeout_secs: env::var("PUBLISH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&secs| secs > 0),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }

        if self.asset_promotion_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "ASSET_PROMOTION_CONCURRENCY must be greater than 0"
            ));
        }

        let backend = self
            .asset_store_backend
            .unwrap_or(AssetStoreBackend::Cloudinary);
        match backend {
            AssetStoreBackend::Cloudinary => {
                if self.cloudinary_cloud_name.is_none()
                    || self.cloudinary_api_key.is_none()
                    || self.cloudinary_api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when using the cloudinary asset store"
                    ));
                }
            }
            AssetStoreBackend::Local => {
                if self.local_asset_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_ASSET_PATH must be set when using the local asset store"
                    ));
                }
                if self.local_asset_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_ASSET_BASE_URL must be set when using the local asset store"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> PublisherConfig {
        PublisherConfig {
            base: BaseConfig {
                environment: "test".to_string(),
                database_url: "postgresql://localhost/lectern".to_string(),
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                log_format: "pretty".to_string(),
            },
            asset_store_backend: Some(AssetStoreBackend::Local),
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
            cloudinary_api_base_url: CLOUDINARY_API_BASE_URL.to_string(),
            local_asset_path: Some("/tmp/lectern-assets".to_string()),
            local_asset_base_url: Some("http://localhost:4000/assets".to_string()),
            asset_root_folder: DEFAULT_ASSET_ROOT.to_string(),
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            asset_promotion_concurrency: DEFAULT_ASSET_PROMOTION_CONCURRENCY,
            publish_timeout_secs: None,
        }
    }

    #[test]
    fn local_backend_requires_path_and_url() {
        let mut config = local_config();
        assert!(config.validate().is_ok());

        config.local_asset_base_url = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn cloudinary_is_the_default_backend() {
        let mut config = local_config();
        config.asset_store_backend = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("CLOUDINARY_CLOUD_NAME"));

        config.cloudinary_cloud_name = Some("demo".to_string());
        config.cloudinary_api_key = Some("key".to_string());
        config.cloudinary_api_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_postgres_urls_and_zero_limits() {
        let mut config = local_config();
        config.base.database_url = "mysql://localhost/lectern".to_string();
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.asset_promotion_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn getters_expose_durations() {
        let mut inner = local_config();
        inner.publish_timeout_secs = Some(90);
        let config = Config(Box::new(inner));
        assert_eq!(config.signed_url_ttl(), Duration::from_secs(3600));
        assert_eq!(config.publish_timeout(), Some(Duration::from_secs(90)));
        assert!(!config.is_production());
    }
}
