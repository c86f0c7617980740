use crate::db::{self, DbPool};
use crate::errors::AppError;
use aws_sdk_s3::{
    error::{ProvideErrorMetadata, SdkError as S3SdkError},
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client as S3Client,
};
use backoff::ExponentialBackoff;
use std::time::Duration;
use tracing;

/// Ensures the S3 bucket exists, creating it with the correct location constraint if needed.
async fn ensure_s3_bucket_exists(client: &S3Client, bucket_name: &str, region_str: &str) -> Result<(), AppError> {
    let bucket_config = if region_str != "us-east-1" {
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region_str))
                .build(),
        )
    } else {
        None
    };

    let mut create_bucket_req_builder = client.create_bucket().bucket(bucket_name);
    if let Some(config) = bucket_config {
        create_bucket_req_builder = create_bucket_req_builder.create_bucket_configuration(config);
    }

    match create_bucket_req_builder.send().await {
        Ok(_) => {
            tracing::info!("Startup: S3 bucket '{}' created.", bucket_name);
            Ok(())
        }
        Err(sdk_err) => {
            if let S3SdkError::ServiceError(service_err) = &sdk_err {
                let code = service_err.err().code();
                if code == Some("BucketAlreadyOwnedByYou") || code == Some("BucketAlreadyExists") {
                    tracing::info!("Startup: S3 bucket '{}' already exists.", bucket_name);
                    return Ok(());
                }
            }
            let context = format!("Startup: Error creating S3 bucket '{}'", bucket_name);
            tracing::warn!("{}: {}", context, sdk_err);
            Err(AppError::InternalServerError(format!("{}: {}", context, sdk_err)))
        }
    }
}

/// Ensures the bucket exists, retrying while the object store comes up.
pub async fn init_bucket(client: &S3Client, bucket_name: &str, region_str: &str) -> Result<(), AppError> {
    let policy = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(60)),
        ..ExponentialBackoff::default()
    };

    backoff::future::retry(policy, || async {
        ensure_s3_bucket_exists(client, bucket_name, region_str)
            .await
            .map_err(backoff::Error::transient)
    })
    .await
}

/// Opens the metadata store and ensures the memes table exists.
pub async fn init_database(database_url: &str) -> Result<DbPool, AppError> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || db::init_pool(&database_url))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Startup: database task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("Startup: {:#}", e)))
}

/// Initializes required resources (memes table, S3 bucket).
pub async fn init_resources(
    s3_client: &S3Client,
    bucket_name: &str,
    region_str: &str,
    database_url: &str,
) -> Result<DbPool, AppError> {
    tracing::info!("Startup: Initializing resources...");
    let pool = init_database(database_url).await?;
    init_bucket(s3_client, bucket_name, region_str).await?;
    tracing::info!("Startup: Resource initialization complete.");
    Ok(pool)
}
