use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use engine_logging::{engine_debug, engine_warn};
use results_core::{NormalizedResult, PollKey};
use serde::{Deserialize, Serialize};

use crate::filename::cache_filename;
use crate::persist::AtomicFileWriter;

/// Persistent store of normalized results keyed by job and persona.
///
/// Caching is an optimization: implementations never surface medium failures
/// to the caller. A failed `put` is a no-op and a failed `get` is a miss.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &PollKey) -> Option<NormalizedResult>;
    fn put(&self, key: &PollKey, result: &NormalizedResult);
    fn evict(&self, key: &PollKey);
}

/// Process-local cache; entries live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, NormalizedResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &PollKey) -> Option<NormalizedResult> {
        let entries = self.entries.lock().ok()?;
        entries.get(&key.cache_key()).cloned()
    }

    fn put(&self, key: &PollKey, result: &NormalizedResult) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.cache_key(), result.clone());
        }
    }

    fn evict(&self, key: &PollKey) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&key.cache_key());
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheDocument {
    key: String,
    result: NormalizedResult,
}

/// One JSON document per key in a directory, so entries survive restarts.
#[derive(Debug, Clone)]
pub struct FileCache {
    writer: AtomicFileWriter,
}

impl FileCache {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }
}

impl ResultCache for FileCache {
    fn get(&self, key: &PollKey) -> Option<NormalizedResult> {
        let cache_key = key.cache_key();
        let filename = cache_filename(&cache_key);
        let content = match self.writer.read(&filename) {
            Ok(Some(content)) => content,
            Ok(None) => {
                engine_debug!("Cache miss for {}", cache_key);
                return None;
            }
            Err(err) => {
                engine_warn!("Failed to read cache entry {}: {}", cache_key, err);
                return None;
            }
        };

        let document: CacheDocument = match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(err) => {
                engine_warn!("Discarding unreadable cache entry {}: {}", cache_key, err);
                return None;
            }
        };
        if document.key != cache_key {
            engine_warn!(
                "Cache file {} holds {} instead of {}",
                filename,
                document.key,
                cache_key
            );
            return None;
        }
        Some(document.result)
    }

    fn put(&self, key: &PollKey, result: &NormalizedResult) {
        let cache_key = key.cache_key();
        let document = CacheDocument {
            key: cache_key.clone(),
            result: result.clone(),
        };
        let content = match serde_json::to_string(&document) {
            Ok(content) => content,
            Err(err) => {
                engine_warn!("Failed to serialize cache entry {}: {}", cache_key, err);
                return;
            }
        };
        if let Err(err) = self.writer.write(&cache_filename(&cache_key), &content) {
            engine_warn!(
                "Failed to write cache entry {} to {:?}: {}",
                cache_key,
                self.writer.dir(),
                err
            );
        }
    }

    fn evict(&self, key: &PollKey) {
        let cache_key = key.cache_key();
        if let Err(err) = self.writer.remove(&cache_filename(&cache_key)) {
            engine_warn!("Failed to evict cache entry {}: {}", cache_key, err);
        }
    }
}
