use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct Entry {
    body: String,
    expires_at: Instant,
}

/// Fixed-key TTL cache for the rendered home listing.
///
/// A hit returns the stored body even if posts changed since it was
/// stored; the only invalidation paths are expiry and an explicit
/// `clear`. A zero TTL disables caching entirely.
#[derive(Clone)]
pub struct ListingCache {
    ttl: Duration,
    slot: Arc<Mutex<Option<Entry>>>,
}

impl ListingCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn get(&self) -> Option<String> {
        let mut slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, body: String) {
        if self.ttl.is_zero() {
            return;
        }
        let mut slot = self.slot.lock().await;
        *slot = Some(Entry {
            body,
            expires_at: Instant::now() + self.ttl,
        });
    }

    pub async fn clear(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_stored_body_while_fresh() {
        let cache = ListingCache::new(60);
        assert_eq!(cache.get().await, None);

        cache.put("listing-v1".to_string()).await;
        assert_eq!(cache.get().await, Some("listing-v1".to_string()));

        // A hit does not reflect later data changes; put overwrites.
        cache.put("listing-v2".to_string()).await;
        assert_eq!(cache.get().await, Some("listing-v2".to_string()));
    }

    #[tokio::test]
    async fn clear_invalidates() {
        let cache = ListingCache::new(60);
        cache.put("listing".to_string()).await;
        cache.clear().await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache = ListingCache::new(0);
        cache.put("listing".to_string()).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ListingCache::new(1);
        cache.put("listing".to_string()).await;
        assert_eq!(cache.get().await, Some("listing".to_string()));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get().await, None);
    }
}
