use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use depot_core::{BlobLocator, FileAnalysis, FileHash, FileId, FileMetadata};
use depot_state::error::StateError;
use depot_state::store::{AnalysisStore, MetadataStore};

use crate::config::PostgresConfig;
use crate::migrations;

/// Open a connection pool for the configured database.
///
/// # Errors
///
/// Returns [`StateError::Connection`] if the URL is invalid or the pool
/// cannot be created.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, StateError> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.pool_size)
        .connect(&config.url)
        .await
        .map_err(|e| StateError::Connection(e.to_string()))
}

fn map_insert_error(e: sqlx::Error, what: &str) -> StateError {
    if let Some(db_err) = e.as_database_error() {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return StateError::Conflict(format!("{what} already exists"));
        }
    }
    StateError::Backend(e.to_string())
}

fn decode_hash(raw: &str) -> Result<FileHash, StateError> {
    FileHash::parse(raw).map_err(|e| StateError::Serialization(e.to_string()))
}

/// PostgreSQL-backed [`MetadataStore`].
///
/// The unique constraint on `hash` is the multi-instance backstop for the
/// upload dedup race: a losing concurrent writer sees
/// [`StateError::Conflict`] instead of creating a second row.
#[derive(Debug)]
pub struct PostgresMetadataStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresMetadataStore {
    /// Connect and run startup migrations (with the configured bounded
    /// retry) before returning a usable store.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if pool creation fails, or
    /// [`StateError::Backend`] once migration attempts are exhausted.
    pub async fn new(config: PostgresConfig) -> Result<Self, StateError> {
        let pool = connect(&config).await?;
        Self::from_pool(pool, config).await
    }

    /// Build a store over an existing pool, sharing it with other backends.
    /// Runs migrations (with retry) on creation.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Backend`] once migration attempts are exhausted.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StateError> {
        migrations::run_migrations_with_retry(&pool, &config)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    fn row_to_metadata(row: &PgRow) -> Result<FileMetadata, StateError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let hash: String = row
            .try_get("hash")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let upload_time: DateTime<Utc> = row
            .try_get("upload_time")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let locator: String = row
            .try_get("locator")
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        Ok(FileMetadata {
            id: FileId::try_from(id).map_err(|e| StateError::Serialization(e.to_string()))?,
            hash: decode_hash(&hash)?,
            upload_time,
            name,
            locator: BlobLocator::new(locator),
        })
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StateError> {
        let query = format!(
            "INSERT INTO {} (id, hash, upload_time, name, locator)
             VALUES ($1, $2, $3, $4, $5)",
            self.config.files_table()
        );
        sqlx::query(&query)
            .bind(metadata.id.as_uuid())
            .bind(metadata.hash.as_str())
            .bind(metadata.upload_time)
            .bind(&metadata.name)
            .bind(metadata.locator.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "file metadata"))?;
        Ok(())
    }

    async fn get(&self, id: FileId) -> Result<Option<FileMetadata>, StateError> {
        let query = format!(
            "SELECT id, hash, upload_time, name, locator FROM {} WHERE id = $1",
            self.config.files_table()
        );
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        row.as_ref().map(Self::row_to_metadata).transpose()
    }

    async fn find_by_hash(&self, hash: &FileHash) -> Result<Option<FileMetadata>, StateError> {
        let query = format!(
            "SELECT id, hash, upload_time, name, locator FROM {} WHERE hash = $1",
            self.config.files_table()
        );
        let row = sqlx::query(&query)
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        row.as_ref().map(Self::row_to_metadata).transpose()
    }
}

/// PostgreSQL-backed [`AnalysisStore`].
#[derive(Debug)]
pub struct PostgresAnalysisStore {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresAnalysisStore {
    /// Connect and run startup migrations (with the configured bounded
    /// retry) before returning a usable store.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if pool creation fails, or
    /// [`StateError::Backend`] once migration attempts are exhausted.
    pub async fn new(config: PostgresConfig) -> Result<Self, StateError> {
        let pool = connect(&config).await?;
        Self::from_pool(pool, config).await
    }

    /// Build a store over an existing pool. Runs migrations (with retry) on
    /// creation.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Backend`] once migration attempts are exhausted.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, StateError> {
        migrations::run_migrations_with_retry(&pool, &config)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    fn row_to_analysis(row: &PgRow) -> Result<FileAnalysis, StateError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let word_count: i64 = row
            .try_get("word_count")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let paragraph_count: i64 = row
            .try_get("paragraph_count")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let char_count: i64 = row
            .try_get("char_count")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let upload_time: DateTime<Utc> = row
            .try_get("upload_time")
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let hash: String = row
            .try_get("hash")
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        Ok(FileAnalysis {
            id: FileId::try_from(id).map_err(|e| StateError::Serialization(e.to_string()))?,
            word_count: u64::try_from(word_count)
                .map_err(|e| StateError::Serialization(e.to_string()))?,
            paragraph_count: u64::try_from(paragraph_count)
                .map_err(|e| StateError::Serialization(e.to_string()))?,
            char_count: u64::try_from(char_count)
                .map_err(|e| StateError::Serialization(e.to_string()))?,
            upload_time,
            hash: decode_hash(&hash)?,
        })
    }
}

#[async_trait]
impl AnalysisStore for PostgresAnalysisStore {
    async fn insert(&self, analysis: &FileAnalysis) -> Result<(), StateError> {
        let query = format!(
            "INSERT INTO {} (id, word_count, paragraph_count, char_count, upload_time, hash)
             VALUES ($1, $2, $3, $4, $5, $6)",
            self.config.analysis_table()
        );
        let word_count = i64::try_from(analysis.word_count)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let paragraph_count = i64::try_from(analysis.paragraph_count)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let char_count = i64::try_from(analysis.char_count)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        sqlx::query(&query)
            .bind(analysis.id.as_uuid())
            .bind(word_count)
            .bind(paragraph_count)
            .bind(char_count)
            .bind(analysis.upload_time)
            .bind(analysis.hash.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, "analysis result"))?;
        Ok(())
    }

    async fn get(&self, id: FileId) -> Result<Option<FileAnalysis>, StateError> {
        let query = format!(
            "SELECT id, word_count, paragraph_count, char_count, upload_time, hash
             FROM {} WHERE id = $1",
            self.config.analysis_table()
        );
        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        row.as_ref().map(Self::row_to_analysis).transpose()
    }
}
