//! Remote (FTP) backend with response caching and explicit reconnects

use super::cache::{CacheKey, CachedResponse, ResponseCache};
use super::ftp::FtpSession;
use super::{BackendKind, EntryInfo, EntryKind, StorageBackend};
use crate::error::{Error, Result};
use crate::utils::helpers::{basename, dirname, normalize_path};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn default_port() -> u16 {
    21
}

fn default_timeout() -> u64 {
    20
}

fn default_passive() -> bool {
    true
}

/// Where and how to reach the FTP server
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout", rename = "timeout_secs")]
    pub timeout: u64,
    #[serde(default = "default_passive")]
    pub passive: bool,
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            use_tls: false,
            port: default_port(),
            timeout: default_timeout(),
            passive: default_passive(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// A live connection to the remote server
pub trait RemoteSession {
    /// Immediate children of `path`; `.`/`..` may or may not be present
    fn list(&mut self, path: &str) -> Result<Vec<EntryInfo>>;

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>>;

    fn close(&mut self) {}
}

/// Opens sessions; swapped out in tests
pub type Connector = Box<dyn Fn(&ConnectionSettings) -> Result<Box<dyn RemoteSession>>>;

pub struct RemoteBackend {
    settings: ConnectionSettings,
    connector: Connector,
    session: RefCell<Option<Box<dyn RemoteSession>>>,
    cache: RefCell<ResponseCache>,
    reconnects: Cell<usize>,
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("host", &self.settings.host)
            .field("port", &self.settings.port)
            .field("reconnects", &self.reconnects.get())
            .finish()
    }
}

impl RemoteBackend {
    /// Connect to an FTP server
    pub fn connect(settings: ConnectionSettings) -> Result<Self> {
        Self::with_connector(
            settings,
            Box::new(|settings| Ok(Box::new(FtpSession::open(settings)?) as Box<dyn RemoteSession>)),
        )
    }

    /// Connect through a custom session factory
    pub fn with_connector(settings: ConnectionSettings, connector: Connector) -> Result<Self> {
        let session = connector(&settings)?;
        tracing::info!(host = %settings.host, port = settings.port, "connected");
        Ok(Self {
            settings,
            connector,
            session: RefCell::new(Some(session)),
            cache: RefCell::new(ResponseCache::new()),
            reconnects: Cell::new(0),
        })
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnects.get()
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn close(&self) {
        if let Some(mut session) = self.session.borrow_mut().take() {
            session.close();
        }
    }

    fn with_session<T>(&self, op: impl FnOnce(&mut dyn RemoteSession) -> Result<T>) -> Result<T> {
        let mut slot = self.session.borrow_mut();
        let session = slot
            .as_mut()
            .ok_or_else(|| Error::connection(format!("no open session to {}", self.settings.host)))?;
        op(session.as_mut())
    }

    /// One directory, straight from the cache or the server
    fn list_one(&self, path: &str) -> Result<Vec<EntryInfo>> {
        let key = CacheKey::list(path, false, true);
        if let Some(entries) = self.cache.borrow_mut().listing(&key) {
            return Ok(entries);
        }
        let entries = self.with_session(|session| session.list(path))?;
        self.cache
            .borrow_mut()
            .insert(key, CachedResponse::Listing(entries.clone()));
        Ok(entries)
    }

    fn walk(&self, path: &str, recursive: bool, out: &mut Vec<EntryInfo>) -> Result<()> {
        for entry in self.list_one(path)? {
            if entry.is_dot() {
                continue;
            }
            let descend = recursive && entry.is_dir();
            let full_path = entry.full_path.clone();
            out.push(entry);
            if descend {
                self.walk(&full_path, true, out)?;
            }
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> Option<EntryInfo> {
        let path = normalize_path(path);
        let name = basename(&path);
        if name.is_empty() {
            return self.list_one("/").ok().map(|_| EntryInfo {
                name: "/".to_string(),
                full_path: "/".to_string(),
                kind: EntryKind::Dir,
                size: 0,
                modified: None,
                permissions: String::new(),
            });
        }
        let parent = match dirname(&path) {
            "" => ".",
            parent => parent,
        };
        self.list_one(parent)
            .ok()?
            .into_iter()
            .find(|entry| entry.name == name)
    }
}

impl Drop for RemoteBackend {
    fn drop(&mut self) {
        self.close();
    }
}

impl StorageBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn describe(&self) -> String {
        format!("ftp://{}@{}:{}", self.settings.username, self.settings.host, self.settings.port)
    }

    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_some()
    }

    fn is_file(&self, path: &str) -> bool {
        self.stat(path).map(|e| e.is_file()).unwrap_or(false)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.stat(path).map(|e| e.is_dir()).unwrap_or(false)
    }

    fn list_entries(&self, path: &str, recursive: bool, include_dots: bool) -> Result<Vec<EntryInfo>> {
        let key = CacheKey::list(path, recursive, include_dots);
        if let Some(entries) = self.cache.borrow_mut().listing(&key) {
            return Ok(entries);
        }

        let mut entries = Vec::new();
        if include_dots {
            entries.extend(self.list_one(path)?.into_iter().filter(EntryInfo::is_dot));
        }
        self.walk(path, recursive, &mut entries)?;

        self.cache
            .borrow_mut()
            .insert(key, CachedResponse::Listing(entries.clone()));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let key = CacheKey::read(path);
        if let Some(bytes) = self.cache.borrow_mut().bytes(&key) {
            return Ok(bytes);
        }
        let bytes = self.with_session(|session| session.retrieve(path))?;
        self.cache
            .borrow_mut()
            .insert(key, CachedResponse::Bytes(bytes.clone()));
        Ok(bytes)
    }

    fn download(&self, remote_path: &str, local_path: &Path) -> Result<()> {
        let target = local_path.to_string_lossy().into_owned();
        let key = CacheKey::download(remote_path, &target);
        let already = matches!(self.cache.borrow_mut().get(&key), Some(CachedResponse::Downloaded));
        if already && local_path.is_file() {
            return Ok(());
        }
        let bytes = self.read_file(remote_path)?;
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent.to_string_lossy(), e))?;
        }
        fs::write(local_path, bytes).map_err(|e| Error::io(target.clone(), e))?;
        self.cache.borrow_mut().insert(key, CachedResponse::Downloaded);
        Ok(())
    }

    fn supports_reconnect(&self) -> bool {
        true
    }

    fn reconnect(&self) -> Result<()> {
        self.close();
        let session = (self.connector)(&self.settings)?;
        *self.session.borrow_mut() = Some(session);
        self.reconnects.set(self.reconnects.get() + 1);
        tracing::info!(host = %self.settings.host, "reconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fake::{backend, server};
    use tempfile::TempDir;

    #[test]
    fn test_recursive_listing_skips_dots_and_is_cached() {
        let server = server();
        let remote = backend(&server);
        let paths: Vec<_> = remote
            .list_entries("/www", true, false)
            .unwrap()
            .into_iter()
            .map(|e| e.full_path)
            .collect();
        assert_eq!(paths, vec!["/www/index.php", "/www/views", "/www/views/list.php"]);
        let lists = server.lists.get();

        remote.list_entries("/www", true, false).unwrap();
        remote.list_entries("/www/", true, false).unwrap();
        assert_eq!(server.lists.get(), lists);
    }

    #[test]
    fn test_include_dots() {
        let server = server();
        let remote = backend(&server);
        let names: Vec<_> = remote
            .list_entries("/www", false, true)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec![".", "..", "index.php", "views"]);
    }

    #[test]
    fn test_read_is_cached() {
        let server = server();
        let remote = backend(&server);
        assert_eq!(remote.read_file("/www/index.php").unwrap(), b"<?php");
        assert_eq!(remote.read_file("/www/index.php").unwrap(), b"<?php");
        assert_eq!(server.reads.get(), 1);
        assert!(matches!(remote.read_file("/www/none.php"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_predicates_use_parent_listing() {
        let server = server();
        let remote = backend(&server);
        assert!(remote.is_file("/www/index.php"));
        assert!(remote.is_dir("/www/views"));
        assert!(!remote.exists("/www/missing.php"));
        assert!(!remote.is_dir("/nowhere/at/all"));
    }

    #[test]
    fn test_reconnect_keeps_cache() {
        let server = server();
        let remote = backend(&server);
        remote.read_file("/www/index.php").unwrap();
        remote.reconnect().unwrap();
        assert_eq!(remote.reconnect_count(), 1);
        assert_eq!(server.connects.get(), 2);
        remote.read_file("/www/index.php").unwrap();
        assert_eq!(server.reads.get(), 1);
    }

    #[test]
    fn test_download_writes_local_file() {
        let server = server();
        let remote = backend(&server);
        let out = TempDir::new().unwrap();
        let target = out.path().join("stage/list.php");
        remote.download("/www/views/list.php", &target).unwrap();
        remote.download("/www/views/list.php", &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"list");
        assert_eq!(server.reads.get(), 1);
    }

    #[test]
    fn test_closed_session_is_connection_error() {
        let server = server();
        let remote = backend(&server);
        remote.close();
        assert!(matches!(
            remote.read_file("/www/index.php"),
            Err(Error::Connection { .. })
        ));
    }
}
