use crate::config::Config;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use tracing;

// Creates the base AWS SDK configuration based on application config.
// Static credentials from `Config` win; otherwise the default provider chain
// (env vars, profiles, etc.) is used.
pub async fn create_sdk_config(config: &Config) -> SdkConfig {
    let region = Region::new(config.aws_region.clone());
    tracing::info!(sdk_region = %config.aws_region, "Setting SDK region");

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region);

    if let Some(endpoint_url) = &config.s3_endpoint {
        tracing::info!("Using object store endpoint override: {}", endpoint_url);
        config_loader = config_loader.endpoint_url(endpoint_url);
    } else {
        tracing::info!("Using default AWS endpoints.");
    }

    if let Some(creds) = &config.s3_credentials {
        tracing::info!(access_key_id = %creds.access_key_id, "Using static object store credentials");
        config_loader = config_loader.credentials_provider(Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            None,
            None,
            "meme_vault_static",
        ));
    } else {
        tracing::info!("Using default credential resolution.");
    }

    config_loader.load().await
}

// Creates an S3 client from a shared SdkConfig.
// Path-style addressing keeps MinIO and LocalStack working.
pub fn create_s3_client(sdk_config: &SdkConfig) -> S3Client {
    let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(true)
        .build();
    S3Client::from_conf(s3_config)
}
