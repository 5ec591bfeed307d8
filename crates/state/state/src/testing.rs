//! Reusable conformance suites for store backends.
//!
//! Call these from a backend's test module with a fresh store instance.

use chrono::{TimeZone, Utc};

use depot_core::{BlobLocator, FileAnalysis, FileHash, FileId, FileMetadata, TextStats};

use crate::error::StateError;
use crate::store::{AnalysisStore, MetadataStore};

fn sample_metadata(name: &str, hash: &str) -> FileMetadata {
    let id = FileId::random();
    FileMetadata {
        id,
        hash: FileHash::parse(hash).expect("test hash should be valid hex"),
        upload_time: Utc.with_ymd_and_hms(2024, 6, 5, 21, 48, 13).unwrap(),
        name: name.to_owned(),
        locator: BlobLocator::new(format!("{id}-{name}")),
    }
}

fn sample_analysis(id: FileId, hash: &str) -> FileAnalysis {
    FileAnalysis::new(
        id,
        TextStats {
            words: 3,
            paragraphs: 1,
            chars: 11,
        },
        Utc.with_ymd_and_hms(2024, 6, 5, 21, 48, 13).unwrap(),
        FileHash::parse(hash).expect("test hash should be valid hex"),
    )
}

/// Run the full metadata store conformance suite.
///
/// # Errors
///
/// Returns an error if any conformance check fails.
pub async fn run_metadata_store_conformance(store: &dyn MetadataStore) -> Result<(), StateError> {
    metadata_get_missing(store).await?;
    metadata_insert_and_get(store).await?;
    metadata_find_by_hash(store).await?;
    metadata_duplicate_id_conflicts(store).await?;
    metadata_duplicate_hash_conflicts(store).await?;
    Ok(())
}

async fn metadata_get_missing(store: &dyn MetadataStore) -> Result<(), StateError> {
    let found = store.get(FileId::random()).await?;
    assert!(found.is_none(), "get on missing id should return None");
    let found = store
        .find_by_hash(&FileHash::parse("feedface").expect("valid hex"))
        .await?;
    assert!(found.is_none(), "find_by_hash on missing hash should return None");
    Ok(())
}

async fn metadata_insert_and_get(store: &dyn MetadataStore) -> Result<(), StateError> {
    let metadata = sample_metadata("a.txt", "aa11");
    store.insert(&metadata).await?;
    let found = store.get(metadata.id).await?;
    assert_eq!(found.as_ref(), Some(&metadata), "get should return the inserted record");
    Ok(())
}

async fn metadata_find_by_hash(store: &dyn MetadataStore) -> Result<(), StateError> {
    let metadata = sample_metadata("b.txt", "bb22");
    store.insert(&metadata).await?;
    let found = store.find_by_hash(&metadata.hash).await?;
    assert_eq!(
        found.as_ref(),
        Some(&metadata),
        "find_by_hash should return the inserted record"
    );
    Ok(())
}

async fn metadata_duplicate_id_conflicts(store: &dyn MetadataStore) -> Result<(), StateError> {
    let first = sample_metadata("c.txt", "cc33");
    store.insert(&first).await?;

    let mut second = sample_metadata("c2.txt", "cc44");
    second.id = first.id;
    let err = store
        .insert(&second)
        .await
        .expect_err("duplicate id insert should conflict");
    assert!(err.is_conflict(), "expected Conflict, got {err}");

    let found = store.get(first.id).await?;
    assert_eq!(found.as_ref(), Some(&first), "original record should survive");
    Ok(())
}

async fn metadata_duplicate_hash_conflicts(store: &dyn MetadataStore) -> Result<(), StateError> {
    let first = sample_metadata("d.txt", "dd55");
    store.insert(&first).await?;

    let second = sample_metadata("d2.txt", "dd55");
    let err = store
        .insert(&second)
        .await
        .expect_err("duplicate hash insert should conflict");
    assert!(err.is_conflict(), "expected Conflict, got {err}");

    let found = store.find_by_hash(&first.hash).await?;
    assert_eq!(found.as_ref(), Some(&first), "original record should survive");
    Ok(())
}

/// Run the full analysis store conformance suite.
///
/// # Errors
///
/// Returns an error if any conformance check fails.
pub async fn run_analysis_store_conformance(store: &dyn AnalysisStore) -> Result<(), StateError> {
    analysis_get_missing(store).await?;
    analysis_insert_and_get(store).await?;
    analysis_duplicate_id_conflicts(store).await?;
    Ok(())
}

async fn analysis_get_missing(store: &dyn AnalysisStore) -> Result<(), StateError> {
    let found = store.get(FileId::random()).await?;
    assert!(found.is_none(), "get on missing id should return None");
    Ok(())
}

async fn analysis_insert_and_get(store: &dyn AnalysisStore) -> Result<(), StateError> {
    let analysis = sample_analysis(FileId::random(), "ee66");
    store.insert(&analysis).await?;
    let found = store.get(analysis.id).await?;
    assert_eq!(found.as_ref(), Some(&analysis), "get should return the inserted record");
    Ok(())
}

async fn analysis_duplicate_id_conflicts(store: &dyn AnalysisStore) -> Result<(), StateError> {
    let first = sample_analysis(FileId::random(), "ff77");
    store.insert(&first).await?;

    let mut second = sample_analysis(first.id, "ff88");
    second.word_count = 99;
    let err = store
        .insert(&second)
        .await
        .expect_err("duplicate analysis insert should conflict");
    assert!(err.is_conflict(), "expected Conflict, got {err}");

    let found = store.get(first.id).await?;
    assert_eq!(
        found.as_ref(),
        Some(&first),
        "first result should never be overwritten"
    );
    Ok(())
}
