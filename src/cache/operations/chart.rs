use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;

use crate::cache::CacheStore;
use crate::charts::{ChartSource, TrackSummary, UpstreamError};

/// Cache-aside reads of the upstream chart.
///
/// A hit is served straight from the cache. A miss fetches upstream, normalizes the
/// tracks, and writes them back with a fixed TTL. Misses for the same key are
/// serialized on a per-key gate and re-check the cache, so one upstream call
/// populates the entry. Upstream failures never touch the cache.
pub struct ChartCache {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn ChartSource>,
    ttl: Duration,
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChartCache {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn ChartSource>, ttl: Duration) -> Self {
        Self {
            cache,
            source,
            ttl,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch(&self, key: &str) -> Result<Vec<TrackSummary>, UpstreamError> {
        if let Some(tracks) = self.read(key).await {
            tracing::info!("Cache hit: {}", key);
            return Ok(tracks);
        }

        let gate = self.gate(key);
        let result = {
            let _guard = gate.lock().await;
            match self.read(key).await {
                Some(tracks) => {
                    tracing::debug!("Cache filled while waiting: {}", key);
                    Ok(tracks)
                }
                None => self.fetch_and_populate(key).await,
            }
        };
        self.release(key, gate);

        result
    }

    async fn read(&self, key: &str) -> Option<Vec<TrackSummary>> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(tracks) => Some(tracks),
                Err(e) => {
                    tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn fetch_and_populate(&self, key: &str) -> Result<Vec<TrackSummary>, UpstreamError> {
        tracing::info!("Cache miss: {}", key);
        let tracks = self.source.fetch_chart().await?.into_summaries();

        match serde_json::to_string(&tracks) {
            Ok(json) => {
                if let Err(e) = self.cache.set_ex(key, &json, self.ttl).await {
                    tracing::warn!("Failed to cache {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize {} for caching: {}", key, e),
        }

        Ok(tracks)
    }

    fn gate(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn release(&self, key: &str, gate: Arc<AsyncMutex<()>>) {
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this caller still hold the gate.
        if Arc::strong_count(&gate) == 2 {
            inflight.remove(key);
        }
        drop(gate);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures_util::future::join_all;

    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::charts::{ChartPayload, RawAlbum, RawArtist, RawTrack, TrackPage};

    const KEY: &str = "deezer_music_data_nepalese";
    const HOUR: Duration = Duration::from_secs(3600);

    struct FakeSource {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl FakeSource {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChartSource for FakeSource {
        async fn fetch_chart(&self) -> Result<ChartPayload, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                let err = serde_json::from_str::<ChartPayload>("{}").unwrap_err();
                return Err(UpstreamError::Malformed(err));
            }
            Ok(ChartPayload {
                tracks: TrackPage {
                    data: vec![RawTrack {
                        id: 1,
                        title: "Resham Firiri".into(),
                        artist: RawArtist {
                            name: "Traditional".into(),
                        },
                        album: RawAlbum {
                            cover_medium: "https://cdn.example/cover.jpg".into(),
                        },
                    }],
                },
            })
        }
    }

    /// Cache whose every operation fails.
    struct BrokenCache;

    #[async_trait]
    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("down".into()))
        }
    }

    fn setup(source: FakeSource) -> (ChartCache, Arc<MemoryCache>, Arc<FakeSource>) {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(source);
        let charts = ChartCache::new(cache.clone(), source.clone(), HOUR);
        (charts, cache, source)
    }

    #[tokio::test(start_paused = true)]
    async fn miss_populates_then_hit_skips_upstream() {
        let (charts, cache, source) = setup(FakeSource::ok());

        let first = charts.get_or_fetch(KEY).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert!(cache.peek(KEY).is_some());
        assert_eq!(first[0].description, "Traditional");
        assert_eq!(first[0].image, "https://cdn.example/cover.jpg");

        tokio::time::advance(Duration::from_secs(3599)).await;
        let second = charts.get_or_fetch(KEY).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_fetched_again() {
        let (charts, _cache, source) = setup(FakeSource::ok());

        charts.get_or_fetch(KEY).await.unwrap();
        tokio::time::advance(HOUR).await;
        charts.get_or_fetch(KEY).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn upstream_failure_leaves_cache_untouched() {
        let (charts, cache, source) = setup(FakeSource::failing());

        let result = charts.get_or_fetch(KEY).await;
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.peek(KEY), None);
    }

    #[tokio::test]
    async fn undecodable_entry_is_replaced() {
        let (charts, cache, source) = setup(FakeSource::ok());
        cache.set_ex(KEY, "not json", HOUR).await.unwrap();

        let tracks = charts.get_or_fetch(KEY).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(tracks.len(), 1);
        assert_ne!(cache.peek(KEY).as_deref(), Some("not json"));
    }

    #[tokio::test]
    async fn broken_cache_still_serves_upstream_data() {
        let source = Arc::new(FakeSource::ok());
        let charts = ChartCache::new(Arc::new(BrokenCache), source.clone(), HOUR);

        let tracks = charts.get_or_fetch(KEY).await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_share_one_fetch() {
        let (charts, _cache, source) = setup(FakeSource::slow(Duration::from_millis(200)));

        let results = join_all((0..8).map(|_| charts.get_or_fetch(KEY))).await;

        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|t| t.len() == 1)));
        assert_eq!(source.calls(), 1);
        assert!(charts.inflight.lock().unwrap().is_empty());
    }
}
