use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// In-process TTL cache for rendered blog responses. Any blog write clears
/// the whole cache, mirroring the coarse invalidation of the read views.
pub struct BlogCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, serde_json::Value)>>,
}

impl BlogCache {
    pub fn new(ttl: Duration) -> Self {
        BlogCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().ok()?;
        let (stored_at, value) = entries.get(key)?;
        if stored_at.elapsed() < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, key: String, value: serde_json::Value) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, (Instant::now(), value));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}
