//! Caching layer in front of the annotation provider
//!
//! [`AnnotationCache`] keys resolved annotations by their normalized
//! variant descriptor and collapses concurrent requests: the first miss
//! for a key installs a pending slot and performs the upstream call,
//! later callers for the same key subscribe to that slot and receive the
//! identical result when it lands. At most one upstream call is in
//! flight per distinct key.
//!
//! Only successful annotations are retained. A failed or not-found fetch
//! leaves the key absent so a later call retries upstream.
//!
//! The map lock is held only for slot bookkeeping, never across an
//! upstream await; unrelated keys proceed in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::error::AnnotateError;
use crate::model::VariantAnnotation;
use crate::provider::AnnotationProvider;
use crate::Result;

/// Statistics for cache usage
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of leading misses (each triggered one upstream call)
    pub misses: u64,
    /// Number of callers collapsed onto an in-flight fetch
    pub collapsed: u64,
    /// Number of entries currently in the cache, pending slots included
    pub size: usize,
    /// Number of pending slots
    pub pending: usize,
    /// Maximum cache capacity
    pub capacity: usize,
    /// Number of evictions
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.collapsed;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

enum Slot {
    /// Resolved annotation with its insertion stamp
    Resolved(VariantAnnotation, u64),
    /// In-flight fetch with subscribed waiters
    Pending(Vec<oneshot::Sender<Result<VariantAnnotation>>>),
}

enum Claim {
    Hit(VariantAnnotation),
    Wait(oneshot::Receiver<Result<VariantAnnotation>>),
    Lead,
}

/// Request-collapsing keyed cache over an [`AnnotationProvider`]
pub struct AnnotationCache {
    provider: Arc<dyn AnnotationProvider>,
    slots: Mutex<HashMap<String, Slot>>,
    capacity: usize,
    stamp: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    collapsed: AtomicU64,
    evictions: AtomicU64,
}

/// Default number of retained annotations
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

impl AnnotationCache {
    /// Create a cache with the default capacity
    pub fn new(provider: Arc<dyn AnnotationProvider>) -> Self {
        Self::with_capacity(provider, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache retaining at most `capacity` resolved annotations
    pub fn with_capacity(provider: Arc<dyn AnnotationProvider>, capacity: usize) -> Self {
        Self {
            provider,
            slots: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            stamp: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            collapsed: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Fetch one annotation, from cache when possible
    pub async fn fetch(&self, key: &str) -> Result<VariantAnnotation> {
        let claim = self.claim(key);

        match claim {
            Claim::Hit(annotation) => Ok(annotation),
            Claim::Wait(rx) => rx.await.unwrap_or_else(|_| Err(abandoned_error())),
            Claim::Lead => {
                let guard = LeadGuard::new(self, vec![key.to_string()]);
                let result = self.fetch_upstream_one(key).await;
                self.complete(key, &result);
                guard.disarm();
                result
            }
        }
    }

    /// Fetch a batch of annotations, preserving input order
    ///
    /// The outer error fires only when the upstream batch call itself
    /// fails; individual not-found keys surface as per-element errors.
    /// The unresolved subset is deduplicated before contacting upstream.
    pub async fn fetch_batch(&self, keys: &[String]) -> Result<Vec<Result<VariantAnnotation>>> {
        let mut outcomes: HashMap<String, Result<VariantAnnotation>> = HashMap::new();
        let mut waits = Vec::new();
        let mut led: Vec<String> = Vec::new();

        for key in keys {
            if outcomes.contains_key(key)
                || waits.iter().any(|(waited, _)| waited == key)
                || led.contains(key)
            {
                continue;
            }
            match self.claim(key) {
                Claim::Hit(annotation) => {
                    outcomes.insert(key.clone(), Ok(annotation));
                }
                Claim::Wait(rx) => waits.push((key.clone(), rx)),
                Claim::Lead => led.push(key.clone()),
            }
        }

        if !led.is_empty() {
            let guard = LeadGuard::new(self, led.clone());
            match self.fetch_upstream_many(&led).await {
                Ok(results) => {
                    for (key, result) in led.iter().zip(results) {
                        self.complete(key, &result);
                        outcomes.insert(key.clone(), result);
                    }
                    guard.disarm();
                }
                Err(err) => {
                    for key in &led {
                        self.complete(key, &Err(err.clone()));
                    }
                    guard.disarm();
                    return Err(err);
                }
            }
        }

        for (key, rx) in waits {
            let result = rx.await.unwrap_or_else(|_| Err(abandoned_error()));
            outcomes.insert(key, result);
        }

        Ok(keys
            .iter()
            .map(|key| {
                outcomes
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| Err(abandoned_error()))
            })
            .collect())
    }

    /// Current usage statistics
    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.lock().unwrap();
        let pending = slots
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            collapsed: self.collapsed.load(Ordering::Relaxed),
            size: slots.len(),
            pending,
            capacity: self.capacity,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop all resolved entries
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap();
        slots.retain(|_, slot| matches!(slot, Slot::Pending(_)));
    }

    /// Classify a key under the lock: hit, subscribe, or lead
    fn claim(&self, key: &str) -> Claim {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(key) {
            Some(Slot::Resolved(annotation, _)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Claim::Hit(annotation.clone())
            }
            Some(Slot::Pending(waiters)) => {
                self.collapsed.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Claim::Wait(rx)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                slots.insert(key.to_string(), Slot::Pending(Vec::new()));
                Claim::Lead
            }
        }
    }

    async fn fetch_upstream_one(&self, key: &str) -> Result<VariantAnnotation> {
        match self.provider.fetch_one(key).await {
            Ok(Some(annotation)) => Ok(claim_descriptor(annotation, key)),
            Ok(None) => Err(AnnotateError::VariantNotFound {
                variant: key.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn fetch_upstream_many(&self, keys: &[String]) -> Result<Vec<Result<VariantAnnotation>>> {
        let results = self.provider.fetch_many(keys).await?;
        if results.len() != keys.len() {
            return Err(AnnotateError::upstream(
                "annotation-provider",
                format!(
                    "batch response length {} does not match request length {}",
                    results.len(),
                    keys.len()
                ),
            ));
        }

        Ok(keys
            .iter()
            .zip(results)
            .map(|(key, result)| match result {
                Some(annotation) => Ok(claim_descriptor(annotation, key)),
                None => Err(AnnotateError::VariantNotFound {
                    variant: key.clone(),
                }),
            })
            .collect())
    }

    /// Settle a pending slot: cache a success, drop the slot otherwise,
    /// and notify every subscribed waiter with the same result
    ///
    /// Idempotent: settling a key with no pending slot is a no-op.
    fn complete(&self, key: &str, result: &Result<VariantAnnotation>) {
        let waiters = {
            let mut slots = self.slots.lock().unwrap();
            let waiters = match slots.remove(key) {
                Some(Slot::Pending(waiters)) => waiters,
                Some(resolved @ Slot::Resolved(..)) => {
                    slots.insert(key.to_string(), resolved);
                    Vec::new()
                }
                None => Vec::new(),
            };

            if let Ok(annotation) = result {
                if slots.len() >= self.capacity {
                    self.evict_oldest(&mut slots);
                }
                let stamp = self.stamp.fetch_add(1, Ordering::Relaxed);
                slots.insert(key.to_string(), Slot::Resolved(annotation.clone(), stamp));
            }

            waiters
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }

    /// Evict the oldest resolved entry; pending slots are never evicted
    fn evict_oldest(&self, slots: &mut HashMap<String, Slot>) {
        let oldest = slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Resolved(_, stamp) => Some((key.clone(), *stamp)),
                Slot::Pending(_) => None,
            })
            .min_by_key(|(_, stamp)| *stamp)
            .map(|(key, _)| key);

        if let Some(key) = oldest {
            tracing::debug!(variant = %key, "evicting oldest cached annotation");
            slots.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Error delivered to waiters whose leading fetch never completed
fn abandoned_error() -> AnnotateError {
    AnnotateError::upstream("annotation-cache", "pending fetch abandoned")
}

/// Annotations sometimes come back without the descriptor they answer;
/// stamp the cache key on so downstream consumers can rely on it
fn claim_descriptor(mut annotation: VariantAnnotation, key: &str) -> VariantAnnotation {
    if annotation.variant.is_empty() {
        annotation.variant = key.to_string();
    }
    annotation
}

/// Settles still-pending led keys if the leading future is dropped
/// mid-fetch, so subscribed waiters are not stranded
struct LeadGuard<'a> {
    cache: &'a AnnotationCache,
    keys: Vec<String>,
    armed: bool,
}

impl<'a> LeadGuard<'a> {
    fn new(cache: &'a AnnotationCache, keys: Vec<String>) -> Self {
        Self {
            cache,
            keys,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LeadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let err = Err(AnnotateError::upstream(
                "annotation-cache",
                "fetch cancelled before completion",
            ));
            for key in &self.keys {
                self.cache.complete(key, &err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Provider that counts upstream calls and can hold them open
    struct CountingProvider {
        inner: crate::provider::MockProvider,
        calls: AtomicUsize,
        batch_calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                inner: crate::provider::MockProvider::with_test_data(),
                calls: AtomicUsize::new(0),
                batch_calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl AnnotationProvider for CountingProvider {
        async fn fetch_one(&self, variant: &str) -> Result<Option<VariantAnnotation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            self.inner.fetch_one(variant).await
        }

        async fn fetch_many(&self, variants: &[String]) -> Result<Vec<Option<VariantAnnotation>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_many(variants).await
        }
    }

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnnotationProvider for FailingProvider {
        async fn fetch_one(&self, _variant: &str) -> Result<Option<VariantAnnotation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AnnotateError::upstream("annotation-provider", "boom"))
        }

        async fn fetch_many(&self, _variants: &[String]) -> Result<Vec<Option<VariantAnnotation>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AnnotateError::upstream("annotation-provider", "boom"))
        }
    }

    #[tokio::test]
    async fn test_fetch_caches_success() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        let first = cache.fetch("7:g.140453136A>T").await.unwrap();
        let second = cache.fetch("7:g.140453136A>T").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        for _ in 0..2 {
            let err = cache.fetch("1:g.1A>T").await.unwrap_err();
            assert!(matches!(err, AnnotateError::VariantNotFound { .. }));
        }

        // both calls went upstream
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = AnnotationCache::new(provider.clone());

        for _ in 0..3 {
            let err = cache.fetch("7:g.140453136A>T").await.unwrap_err();
            assert!(matches!(err, AnnotateError::Upstream { .. }));
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_collapse_to_one_call() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = Arc::new(CountingProvider::gated(gate.clone()));
        let cache = Arc::new(AnnotationCache::new(provider.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.fetch("7:g.140453136A>T").await
            }));
        }

        // let every task reach the cache before releasing the provider
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        gate.add_permits(1);

        let mut annotations = Vec::new();
        for handle in handles {
            annotations.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        for annotation in &annotations {
            assert_eq!(annotation, &annotations[0]);
        }
        assert_eq!(cache.stats().collapsed, 7);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_not_found() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        let keys = vec![
            "12:g.25398285C>A".to_string(),
            "1:g.1A>T".to_string(),
            "7:g.140453136A>T".to_string(),
        ];
        let results = cache.fetch_batch(&keys).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().seq_region_name.as_deref(),
            Some("12")
        );
        assert!(matches!(
            results[1],
            Err(AnnotateError::VariantNotFound { .. })
        ));
        assert_eq!(
            results[2].as_ref().unwrap().seq_region_name.as_deref(),
            Some("7")
        );
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_deduplicates_keys() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        let keys = vec![
            "7:g.140453136A>T".to_string(),
            "7:g.140453136A>T".to_string(),
            "7:g.140453136A>T".to_string(),
        ];
        let results = cache.fetch_batch(&keys).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_uses_cached_entries() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        cache.fetch("7:g.140453136A>T").await.unwrap();

        let keys = vec![
            "7:g.140453136A>T".to_string(),
            "12:g.25398285C>A".to_string(),
        ];
        let results = cache.fetch_batch(&keys).await.unwrap();
        assert!(results.iter().all(|r| r.is_ok()));

        // the cached key was not re-requested
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_upstream_failure_fails_whole_batch() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = AnnotationCache::new(provider);

        let keys = vec!["7:g.140453136A>T".to_string(), "1:g.1A>T".to_string()];
        let err = cache.fetch_batch(&keys).await.unwrap_err();
        assert!(matches!(err, AnnotateError::Upstream { .. }));

        // failed keys are absent, a retry goes upstream again
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_eviction_at_capacity() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::with_capacity(provider.clone(), 1);

        cache.fetch("7:g.140453136A>T").await.unwrap();
        cache.fetch("12:g.25398285C>A").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.evictions, 1);

        // the evicted key goes upstream again
        cache.fetch("7:g.140453136A>T").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let provider = Arc::new(CountingProvider::new());
        let cache = AnnotationCache::new(provider.clone());

        cache.fetch("7:g.140453136A>T").await.unwrap();
        assert_eq!(cache.stats().size, 1);

        cache.clear();
        assert_eq!(cache.stats().size, 0);

        cache.fetch("7:g.140453136A>T").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            collapsed: 0,
            size: 1,
            pending: 0,
            capacity: 10,
            evictions: 0,
        };
        assert!((stats.hit_rate() - 75.0).abs() < 0.01);

        let empty = CacheStats::default();
        assert!((empty.hit_rate() - 0.0).abs() < 0.01);
    }
}
