//! In-memory FTP server for tests

use super::remote::{ConnectionSettings, RemoteBackend, RemoteSession};
use super::{EntryInfo, EntryKind};
use crate::error::{Error, Result};
use crate::utils::helpers::{join_path, normalize_path};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Directories map to their children
#[derive(Default)]
pub(crate) struct FakeServer {
    pub dirs: BTreeMap<String, Vec<(String, bool)>>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub lists: Cell<usize>,
    pub reads: Cell<usize>,
    pub connects: Cell<usize>,
}

pub(crate) struct FakeSession(Rc<FakeServer>);

impl RemoteSession for FakeSession {
    fn list(&mut self, path: &str) -> Result<Vec<EntryInfo>> {
        self.0.lists.set(self.0.lists.get() + 1);
        let children = self
            .0
            .dirs
            .get(&normalize_path(path))
            .ok_or_else(|| Error::not_found(path))?;
        let mut entries = vec![(".".to_string(), true), ("..".to_string(), true)];
        entries.extend(children.iter().cloned());
        Ok(entries
            .into_iter()
            .map(|(name, dir)| EntryInfo {
                full_path: join_path(&[path, &name]),
                size: if dir { 0 } else { 1 },
                name,
                kind: if dir { EntryKind::Dir } else { EntryKind::File },
                modified: None,
                permissions: String::new(),
            })
            .collect())
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
        self.0.reads.set(self.0.reads.get() + 1);
        self.0
            .files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }
}

/// `/www` holding `index.php` and `views/list.php`
pub(crate) fn server() -> Rc<FakeServer> {
    let mut server = FakeServer::default();
    server.dirs.insert(
        "/www".into(),
        vec![("index.php".into(), false), ("views".into(), true)],
    );
    server.dirs.insert("/www/views".into(), vec![("list.php".into(), false)]);
    server.files.insert("/www/index.php".into(), b"<?php".to_vec());
    server.files.insert("/www/views/list.php".into(), b"list".to_vec());
    Rc::new(server)
}

pub(crate) fn backend(server: &Rc<FakeServer>) -> RemoteBackend {
    let shared = Rc::clone(server);
    RemoteBackend::with_connector(
        ConnectionSettings::new("ftp.example.com", "user", "secret"),
        Box::new(move |_| {
            shared.connects.set(shared.connects.get() + 1);
            Ok(Box::new(FakeSession(Rc::clone(&shared))) as Box<dyn RemoteSession>)
        }),
    )
    .unwrap()
}
