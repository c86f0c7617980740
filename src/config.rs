use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

use crate::lifecycle::StorageLayout;
use crate::reads::ListPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub public_bind_address: SocketAddr,
    pub private_bind_address: SocketAddr,
    /// SQLite file path, or `:memory:`.
    pub database_url: String,
    pub meme_bucket_name: String,
    pub aws_region: String,
    // MinIO / LocalStack override
    pub s3_endpoint: Option<String>,
    pub s3_credentials: Option<StaticCredentials>,
    pub image_url_base: String,
    pub api_keys: Vec<String>,
    pub list_policy: ListPolicy,
    pub max_upload_bytes: usize,
}

#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

// Keep secrets out of logs.
impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_bind_address =
            parse_address(&lookup, "PUBLIC_BIND_ADDRESS", "0.0.0.0:8000")?;
        let private_bind_address =
            parse_address(&lookup, "PRIVATE_BIND_ADDRESS", "0.0.0.0:8001")?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "memes.db".to_string());

        let meme_bucket_name = lookup("MEME_BUCKET_NAME").unwrap_or_else(|| "memes".to_string());
        if meme_bucket_name.trim().is_empty() {
            return Err(ConfigError::InvalidVar(
                "MEME_BUCKET_NAME".into(),
                "bucket name cannot be empty".into(),
            ));
        }

        let aws_region = lookup("AWS_DEFAULT_REGION").unwrap_or_else(|| "us-east-1".to_string());
        let s3_endpoint = lookup("AWS_ENDPOINT_URL").filter(|s| !s.is_empty());

        let s3_credentials = match (lookup("S3_ACCESS_KEY_ID"), lookup("S3_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingVar("S3_SECRET_ACCESS_KEY".into())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("S3_ACCESS_KEY_ID".into())),
        };

        let image_url_base = lookup("IMAGE_URL_BASE")
            .unwrap_or_else(|| format!("http://{}", meme_bucket_name))
            .trim_end_matches('/')
            .to_string();

        let api_keys: Vec<String> = lookup("API_KEYS")
            .ok_or_else(|| ConfigError::MissingVar("API_KEYS".into()))?
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if api_keys.is_empty() {
            return Err(ConfigError::InvalidVar(
                "API_KEYS".into(),
                "at least one non-empty key is required".into(),
            ));
        }

        let list_policy = match lookup("EMPTY_LIST_POLICY") {
            Some(raw) => ListPolicy::from_str(&raw)
                .map_err(|e| ConfigError::InvalidVar("EMPTY_LIST_POLICY".into(), e))?,
            None => ListPolicy::default(),
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidVar("MAX_UPLOAD_BYTES".into(), e.to_string()))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            public_bind_address,
            private_bind_address,
            database_url,
            meme_bucket_name,
            aws_region,
            s3_endpoint,
            s3_credentials,
            image_url_base,
            api_keys,
            list_policy,
            max_upload_bytes,
        })
    }

    /// Object naming handed to the lifecycle manager.
    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new(self.meme_bucket_name.clone(), self.image_url_base.clone())
    }
}

fn parse_address<F>(lookup: &F, name: &str, default: &str) -> Result<SocketAddr, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    SocketAddr::from_str(&raw).map_err(|e| ConfigError::InvalidVar(name.into(), e.to_string()))
}
