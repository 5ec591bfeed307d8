use std::sync::Arc;

use tracing::{debug, info};

use depot_core::{FileAnalysis, FileId, TextStats};
use depot_state::{AnalysisStore, StateError};

use crate::error::AnalysisError;
use crate::fetch::FileFetcher;

/// UTF-8 byte order mark, tolerated (and stripped) at the start of content.
const BOM: &[u8] = b"\xef\xbb\xbf";

/// Orchestrates the idempotent analyze operation: cache lookup, one-time
/// retrieval from storage, statistics, and insert-once persistence.
pub struct AnalysisService {
    cache: Arc<dyn AnalysisStore>,
    fetcher: Arc<dyn FileFetcher>,
}

impl AnalysisService {
    /// Assemble the service from its cache and the retrieval client.
    pub fn new(cache: Arc<dyn AnalysisStore>, fetcher: Arc<dyn FileFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Analyze a stored file, computing statistics at most once per id.
    ///
    /// A cached result is returned directly with no re-fetch and no
    /// re-compute. On a miss the file is pulled from storage, decoded as
    /// UTF-8 (an optional BOM is stripped), measured, and persisted. If a
    /// concurrent analyze for the same id persisted first, the winner's
    /// record is re-read and returned; both callers observe identical
    /// results.
    pub async fn analyze(&self, id: FileId) -> Result<FileAnalysis, AnalysisError> {
        if let Some(existing) = self.cache.get(id).await? {
            debug!(id = %id, "analysis cache hit");
            return Ok(existing);
        }

        let fetched = self
            .fetcher
            .fetch(id)
            .await
            .map_err(|e| AnalysisError::from_fetch(id, e))?;

        let text = decode_text(&fetched.content).ok_or(AnalysisError::UnreadableContent(id))?;
        let stats = TextStats::compute(text);

        let analysis = FileAnalysis::new(id, stats, fetched.upload_time, fetched.hash);

        match self.cache.insert(&analysis).await {
            Ok(()) => {
                info!(
                    id = %id,
                    words = stats.words,
                    paragraphs = stats.paragraphs,
                    chars = stats.chars,
                    "analysis stored"
                );
                Ok(analysis)
            }
            Err(StateError::Conflict(_)) => {
                // A concurrent analyze won; its result is canonical.
                self.cache
                    .get(id)
                    .await?
                    .ok_or(AnalysisError::Conflict(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Decode content as UTF-8 text, tolerating an optional leading BOM.
fn decode_text(content: &[u8]) -> Option<&str> {
    let stripped = content.strip_prefix(BOM).unwrap_or(content);
    std::str::from_utf8(stripped).ok()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};

    use depot_core::FileHash;
    use depot_state_memory::MemoryAnalysisStore;

    use crate::fetch::{FetchError, FetchedFile};

    use super::*;

    /// Fetcher double that serves fixed content and counts calls.
    struct CountingFetcher {
        content: Option<Bytes>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn serving(content: &[u8]) -> Self {
            Self {
                content: Some(Bytes::copy_from_slice(content)),
                calls: AtomicUsize::new(0),
            }
        }

        fn empty_handed() -> Self {
            Self {
                content: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FileFetcher for CountingFetcher {
        async fn fetch(&self, id: FileId) -> Result<FetchedFile, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.content {
                Some(content) => Ok(FetchedFile {
                    content: content.clone(),
                    hash: FileHash::parse("deadbeef").unwrap(),
                    upload_time: Utc.with_ymd_and_hms(2024, 6, 5, 21, 48, 13).unwrap(),
                }),
                None => Err(FetchError::NotFound(id)),
            }
        }
    }

    fn service(fetcher: Arc<CountingFetcher>) -> AnalysisService {
        AnalysisService::new(Arc::new(MemoryAnalysisStore::new()), fetcher)
    }

    #[tokio::test]
    async fn analyze_computes_and_copies_provenance() {
        let fetcher = Arc::new(CountingFetcher::serving(b"a b\n\nc"));
        let service = service(Arc::clone(&fetcher));

        let result = service.analyze(FileId::random()).await.unwrap();
        assert_eq!(result.word_count, 3);
        assert_eq!(result.paragraph_count, 2);
        assert_eq!(result.char_count, 6);
        assert_eq!(result.hash, FileHash::parse("deadbeef").unwrap());
        assert_eq!(
            result.upload_time,
            Utc.with_ymd_and_hms(2024, 6, 5, 21, 48, 13).unwrap()
        );
    }

    #[tokio::test]
    async fn second_analyze_hits_the_cache_without_refetching() {
        let fetcher = Arc::new(CountingFetcher::serving(b"cache me"));
        let service = service(Arc::clone(&fetcher));
        let id = FileId::random();

        let first = service.analyze(id).await.unwrap();
        let second = service.analyze(id).await.unwrap();

        assert_eq!(first, second, "both calls must return identical results");
        assert_eq!(fetcher.calls(), 1, "the second call must not re-fetch");
    }

    #[tokio::test]
    async fn unknown_source_is_source_not_found() {
        let fetcher = Arc::new(CountingFetcher::empty_handed());
        let service = service(fetcher);

        let err = service
            .analyze(FileId::random())
            .await
            .expect_err("missing source should fail");
        assert!(matches!(err, AnalysisError::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_is_unreadable_content() {
        let fetcher = Arc::new(CountingFetcher::serving(&[0xff, 0xfe, 0x00]));
        let service = service(fetcher);

        let err = service
            .analyze(FileId::random())
            .await
            .expect_err("invalid utf-8 should fail");
        assert!(matches!(err, AnalysisError::UnreadableContent(_)));
    }

    #[tokio::test]
    async fn bom_is_stripped_before_counting() {
        let mut content = b"\xef\xbb\xbf".to_vec();
        content.extend_from_slice(b"word");
        let fetcher = Arc::new(CountingFetcher::serving(&content));
        let service = service(fetcher);

        let result = service.analyze(FileId::random()).await.unwrap();
        assert_eq!(result.word_count, 1);
        assert_eq!(result.char_count, 4, "the BOM is not a counted character");
    }

    #[tokio::test]
    async fn whitespace_only_text_counts_nothing() {
        let fetcher = Arc::new(CountingFetcher::serving(b" \n\t "));
        let service = service(fetcher);

        let result = service.analyze(FileId::random()).await.unwrap();
        assert_eq!(result.word_count, 0);
        assert_eq!(result.paragraph_count, 0);
    }

    #[tokio::test]
    async fn concurrent_analyzes_agree_on_one_result() {
        let fetcher = Arc::new(CountingFetcher::serving(b"raced text"));
        let service = Arc::new(service(Arc::clone(&fetcher)));
        let id = FileId::random();

        let mut tasks = Vec::new();
        for _ in 0..6 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move { service.analyze(id).await }));
        }

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap().unwrap());
        }
        for pair in results.windows(2) {
            assert_eq!(pair[0], pair[1], "all racers must observe one record");
        }
    }
}
