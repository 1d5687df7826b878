use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Default lifetime of a cached pair rate, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy)]
struct RateEntry {
    rate: f64,
    observed_at: i64,
}

/// Time-bounded memo of resolved per-unit pair rates.
///
/// Keys are ordered (base, quote) lowercase code pairs — a cached A→B rate
/// does not satisfy a request for B→A. Entries are never evicted, only
/// overwritten or ignored once stale; staleness is checked at read time.
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct RateCache {
    inner: Arc<Mutex<HashMap<(String, String), RateEntry>>>,
    ttl_secs: i64,
}

impl RateCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl_secs,
        }
    }

    /// Returns the cached rate and its observation timestamp, or `None`
    /// when the pair is absent or older than the TTL.
    pub async fn get(&self, base: &str, quote: &str) -> Option<(f64, i64)> {
        let key = (base.to_lowercase(), quote.to_lowercase());
        let cache = self.inner.lock().await;
        let now = chrono::Utc::now().timestamp();
        match cache.get(&key) {
            Some(entry) if now - entry.observed_at < self.ttl_secs => {
                debug!("Cache HIT for {}/{}", key.0, key.1);
                Some((entry.rate, entry.observed_at))
            }
            Some(_) => {
                debug!("Cache STALE for {}/{}", key.0, key.1);
                None
            }
            None => {
                debug!("Cache MISS for {}/{}", key.0, key.1);
                None
            }
        }
    }

    /// Stores a per-unit rate observed now, overwriting any prior entry
    /// for that exact ordered pair.
    pub async fn put(&self, base: &str, quote: &str, rate: f64) {
        let key = (base.to_lowercase(), quote.to_lowercase());
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for {}/{}: {}", key.0, key.1, rate);
        cache.insert(
            key,
            RateEntry {
                rate,
                observed_at: chrono::Utc::now().timestamp(),
            },
        );
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = RateCache::new();

        assert!(cache.get("usd", "rub").await.is_none());

        cache.put("usd", "rub", 90.0).await;

        let (rate, observed_at) = cache.get("usd", "rub").await.unwrap();
        assert_eq!(rate, 90.0);
        assert!(observed_at <= chrono::Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_cache_key_is_ordered() {
        let cache = RateCache::new();
        cache.put("usd", "rub", 90.0).await;

        // The reverse pair is a different key.
        assert!(cache.get("rub", "usd").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_keys_are_case_insensitive() {
        let cache = RateCache::new();
        cache.put("USD", "RUB", 90.0).await;
        assert!(cache.get("usd", "rub").await.is_some());
    }

    #[tokio::test]
    async fn test_stale_entry_is_ignored() {
        let cache = RateCache::with_ttl(0);
        cache.put("usd", "rub", 90.0).await;

        // TTL of zero makes every entry stale at read time.
        assert!(cache.get("usd", "rub").await.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = RateCache::new();
        cache.put("usd", "rub", 90.0).await;
        cache.put("usd", "rub", 95.0).await;

        let (rate, _) = cache.get("usd", "rub").await.unwrap();
        assert_eq!(rate, 95.0);
    }
}
