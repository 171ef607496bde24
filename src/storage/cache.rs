//! In-memory response cache for the remote backend
//!
//! Unbounded and never invalidated: a packaging run assumes the remote tree
//! does not change underneath it. Do not share one cache between concurrent
//! runs, and do not expect a fresh read after mutating the remote side
//! through the same backend.

use super::EntryInfo;
use crate::utils::helpers::normalize_path;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: Operation,
    pub path: String,
    pub recursive: bool,
    pub include_dots: bool,
    /// Local target of a download
    pub target: Option<String>,
}

impl CacheKey {
    pub fn list(path: &str, recursive: bool, include_dots: bool) -> Self {
        Self {
            operation: Operation::List,
            path: normalize_path(path),
            recursive,
            include_dots,
            target: None,
        }
    }

    pub fn read(path: &str) -> Self {
        Self {
            operation: Operation::Read,
            path: normalize_path(path),
            recursive: false,
            include_dots: false,
            target: None,
        }
    }

    pub fn download(path: &str, target: &str) -> Self {
        Self {
            operation: Operation::Download,
            path: normalize_path(path),
            recursive: false,
            include_dots: false,
            target: Some(target.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedResponse {
    Listing(Vec<EntryInfo>),
    Bytes(Vec<u8>),
    Downloaded,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, CachedResponse>,
    hits: usize,
    misses: usize,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<&CachedResponse> {
        match self.entries.get(key) {
            Some(response) => {
                self.hits += 1;
                tracing::debug!(path = %key.path, operation = ?key.operation, "cache hit");
                Some(response)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn listing(&mut self, key: &CacheKey) -> Option<Vec<EntryInfo>> {
        match self.get(key) {
            Some(CachedResponse::Listing(entries)) => Some(entries.clone()),
            _ => None,
        }
    }

    pub fn bytes(&mut self, key: &CacheKey) -> Option<Vec<u8>> {
        match self.get(key) {
            Some(CachedResponse::Bytes(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: CacheKey, response: CachedResponse) {
        self.entries.insert(key, response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_normalize_paths() {
        assert_eq!(CacheKey::read("/www//a/b.php"), CacheKey::read("/www/a/b.php/"));
        assert_ne!(CacheKey::list("/www", true, false), CacheKey::list("/www", false, false));
        assert_ne!(CacheKey::read("/www/a"), CacheKey::list("/www/a", false, false));
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = ResponseCache::new();
        let key = CacheKey::read("/a.txt");
        assert!(cache.bytes(&key).is_none());
        cache.insert(key.clone(), CachedResponse::Bytes(b"hi".to_vec()));
        assert_eq!(cache.bytes(&key).unwrap(), b"hi");
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
    }
}
