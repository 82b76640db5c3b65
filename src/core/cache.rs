use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Source of the current time, injected so expiry can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Stored less than the TTL ago.
    Fresh(V),
    /// Present but older than the TTL.
    Stale(V),
    Miss,
}

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Keyed cache whose entries go stale after a fixed TTL but are never evicted,
/// so an expired value can still serve as a fallback.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, Entry<V>>>>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    pub fn new(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    pub async fn get(&self, key: &K) -> Lookup<V> {
        let cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) if self.clock.now() - entry.stored_at < self.ttl => {
                debug!("Cache HIT for key: {:?}", key);
                Lookup::Fresh(entry.value.clone())
            }
            Some(entry) => {
                debug!("Cache entry expired for key: {:?}", key);
                Lookup::Stale(entry.value.clone())
            }
            None => {
                debug!("Cache MISS for key: {:?}", key);
                Lookup::Miss
            }
        }
    }

    pub async fn put(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key, Entry { value, stored_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_cache(ttl_secs: i64) -> (Arc<ManualClock>, Cache<String, i32>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Cache::new(TimeDelta::seconds(ttl_secs), clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_cache_get_put() {
        let (_, cache) = manual_cache(30);

        // Initially, cache is empty
        assert_eq!(cache.get(&"key1".to_string()).await, Lookup::Miss);

        cache.put("key1".to_string(), 123).await;

        assert_eq!(cache.get(&"key1".to_string()).await, Lookup::Fresh(123));
        assert_eq!(cache.get(&"key2".to_string()).await, Lookup::Miss);
    }

    #[tokio::test]
    async fn test_cache_entry_goes_stale_after_ttl() {
        let (clock, cache) = manual_cache(30);
        cache.put("USD".to_string(), 1).await;

        clock.advance(TimeDelta::seconds(29));
        assert_eq!(cache.get(&"USD".to_string()).await, Lookup::Fresh(1));

        clock.advance(TimeDelta::seconds(1));
        assert_eq!(cache.get(&"USD".to_string()).await, Lookup::Stale(1));

        // A new put refreshes the timestamp
        cache.put("USD".to_string(), 2).await;
        assert_eq!(cache.get(&"USD".to_string()).await, Lookup::Fresh(2));
    }
}
