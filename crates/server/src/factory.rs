use std::sync::Arc;

use depot_blob::BlobStore;
use depot_blob_fs::FsBlobStore;
use depot_blob_memory::MemoryBlobStore;
use depot_state::{AnalysisStore, DigestLock, MetadataStore};
use depot_state_memory::{MemoryAnalysisStore, MemoryDigestLock, MemoryMetadataStore};
use depot_state_postgres::{PostgresAnalysisStore, PostgresConfig, PostgresMetadataStore};

use crate::config::{BlobConfig, StateConfig};
use crate::error::ServerError;

/// Stores backing the storage service: metadata plus the per-digest lock.
pub type StoragePair = (Arc<dyn MetadataStore>, Arc<dyn DigestLock>);

/// Construct the metadata store and digest lock from configuration.
pub async fn create_metadata_store(config: &StateConfig) -> Result<StoragePair, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok((
            Arc::new(MemoryMetadataStore::new()),
            Arc::new(MemoryDigestLock::new()),
        )),
        "postgres" => {
            let pg_config = postgres_config(config)?;
            let store = PostgresMetadataStore::new(pg_config)
                .await
                .map_err(|e| ServerError::Config(format!("postgres metadata store: {e}")))?;
            // The postgres unique hash constraint closes the upload race
            // across instances; the in-process lock still serializes
            // same-digest uploads within this one.
            Ok((Arc::new(store), Arc::new(MemoryDigestLock::new())))
        }
        other => Err(ServerError::Config(format!(
            "unsupported state backend: {other} (expected 'memory' or 'postgres')"
        ))),
    }
}

/// Construct the analysis result cache from configuration.
pub async fn create_analysis_store(
    config: &StateConfig,
) -> Result<Arc<dyn AnalysisStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryAnalysisStore::new())),
        "postgres" => {
            let pg_config = postgres_config(config)?;
            let store = PostgresAnalysisStore::new(pg_config)
                .await
                .map_err(|e| ServerError::Config(format!("postgres analysis store: {e}")))?;
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!(
            "unsupported state backend: {other} (expected 'memory' or 'postgres')"
        ))),
    }
}

/// Construct the blob store from configuration.
pub async fn create_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        "fs" => {
            let store = FsBlobStore::open(config.path.as_str())
                .await
                .map_err(|e| ServerError::Config(format!("blob store at {}: {e}", config.path)))?;
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!(
            "unsupported blob backend: {other} (expected 'memory' or 'fs')"
        ))),
    }
}

/// Translate the `[state]` section into a postgres backend configuration.
pub fn postgres_config(config: &StateConfig) -> Result<PostgresConfig, ServerError> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| ServerError::Config("postgres backend requires 'url' in [state]".into()))?;
    let mut pg_config = PostgresConfig {
        url: url.to_owned(),
        ..PostgresConfig::default()
    };
    if let Some(size) = config.pool_size {
        pg_config.pool_size = size;
    }
    if let Some(ref prefix) = config.prefix {
        pg_config.table_prefix.clone_from(prefix);
    }
    Ok(pg_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateConfig;

    #[tokio::test]
    async fn memory_backend_builds() {
        let config = StateConfig::default();
        let (_store, _lock) = create_metadata_store(&config).await.unwrap();
        let _cache = create_analysis_store(&config).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let config = StateConfig {
            backend: "etcd".to_owned(),
            ..StateConfig::default()
        };
        let err = create_metadata_store(&config).await.unwrap_err();
        assert!(err.to_string().contains("unsupported state backend"));
    }

    #[tokio::test]
    async fn postgres_without_url_is_rejected() {
        let config = StateConfig {
            backend: "postgres".to_owned(),
            ..StateConfig::default()
        };
        let err = create_analysis_store(&config).await.unwrap_err();
        assert!(err.to_string().contains("requires 'url'"));
    }

    #[tokio::test]
    async fn fs_blob_store_builds_in_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let config = BlobConfig {
            backend: "fs".to_owned(),
            path: dir.path().display().to_string(),
        };
        create_blob_store(&config).await.unwrap();
    }
}
