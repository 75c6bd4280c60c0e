use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Thread-safe LRU cache of page embeddings
///
/// Keyed by a SHA-256 digest of the embedded text, so popular pages that
/// turn up in many searches are embedded once and full page bodies are not
/// held as keys.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

/// Hex SHA-256 digest used as the cache key.
pub fn text_key(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

impl EmbeddingCache {
    /// Create a new embedding cache holding at most `capacity` vectors (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.cache.lock().unwrap().get(&text_key(text)).cloned()
    }

    pub fn put(&self, text: &str, embedding: Vec<f32>) {
        self.cache.lock().unwrap().put(text_key(text), embedding);
    }
}
