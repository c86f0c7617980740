pub mod auth;
pub mod aws_clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod reads;
pub mod repositories;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::domain::{CredentialVerifier, FileStorage, MemeRepository};
use crate::lifecycle::{MemeLifecycleManager, StorageLayout};
use crate::reads::{ListPolicy, MemeReader};

/// AppState holds shared resources for both web surfaces.
pub struct AppState {
    pub lifecycle: MemeLifecycleManager,
    pub reader: MemeReader,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn MemeRepository>,
        storage: Arc<dyn FileStorage>,
        verifier: Arc<dyn CredentialVerifier>,
        layout: StorageLayout,
        list_policy: ListPolicy,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            lifecycle: MemeLifecycleManager::new(repo.clone(), storage, layout),
            reader: MemeReader::new(repo, list_policy),
            verifier,
            max_upload_bytes,
        }
    }
}
