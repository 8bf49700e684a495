//! Process-wide cache for model responses, so identical pages are not
//! re-sent to the provider.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::debug;
use serde_json::Value;
use xxhash_rust::xxh3::Xxh3;

/// Key a cached response by operation kind, source URL and page HTML
pub fn cache_key(kind: &str, url: &str, html: &str) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(url.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(html.as_bytes());
    hasher.digest()
}

struct CacheEntry {
    value: Value,
    inserted: Instant,
}

/// Expiring key/value map, shared across requests. Entries are evicted
/// lazily on lookup; there is no single-flight de-duplication, so
/// concurrent misses for the same key may both call the model.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        ResponseCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: u64) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(&key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => {
                debug!("llm cache hit for key {key:x}");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: u64, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    value,
                    inserted: Instant::now(),
                },
            );
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
