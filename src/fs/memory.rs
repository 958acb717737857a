//! In-memory implementation of the [`Filesystem`] trait.
//!
//! Backs the unit tests for the walker, planner, executor, and engine so
//! they can run against literal directory trees without touching disk.
//! Per-path failure injection (`deny`) simulates permission errors.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use super::{FileKind, FileStat, Filesystem};

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Directory,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<PathBuf, Node>,
    denied: HashSet<PathBuf>,
}

/// An in-memory directory tree.
#[derive(Debug, Default)]
pub struct MemoryFs {
    inner: Mutex<Inner>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory, creating missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        add_parents(&mut inner.nodes, path.as_ref());
        inner
            .nodes
            .insert(path.as_ref().to_path_buf(), Node::Directory);
    }

    /// Create a file with the given contents, creating missing parents.
    pub fn add_file(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.add_file_with_mtime(path, data, SystemTime::now());
    }

    /// Create a file with an explicit modification time.
    pub fn add_file_with_mtime(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
        modified: SystemTime,
    ) {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        add_parents(&mut inner.nodes, path.as_ref());
        inner.nodes.insert(
            path.as_ref().to_path_buf(),
            Node::File {
                data: data.to_vec(),
                modified,
            },
        );
    }

    /// Make every subsequent operation touching `path` fail with
    /// `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        inner.denied.insert(path.as_ref().to_path_buf());
    }

    /// The contents of a file, if it exists.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let inner = self.inner.lock().expect("memory fs lock poisoned");
        match inner.nodes.get(path.as_ref()) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// All paths currently in the tree, in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        let inner = self.inner.lock().expect("memory fs lock poisoned");
        inner.nodes.keys().cloned().collect()
    }
}

fn add_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !nodes.contains_key(parent) {
            add_parents(nodes, parent);
            nodes.insert(parent.to_path_buf(), Node::Directory);
        }
    }
}

fn denied_error(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("access denied: {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such entry: {}", path.display()),
    )
}

impl Filesystem for MemoryFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match inner.nodes.get(path) {
            Some(Node::Directory) => Ok(inner
                .nodes
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            Some(Node::File { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match inner.nodes.get(path) {
            Some(Node::File { data, modified }) => Ok(FileStat {
                kind: FileKind::File,
                size: data.len() as u64,
                modified: Some(*modified),
            }),
            Some(Node::Directory) => Ok(FileStat {
                kind: FileKind::Directory,
                size: 0,
                modified: None,
            }),
            None => Err(not_found(path)),
        }
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match inner.nodes.get(path) {
            Some(Node::File { data, .. }) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(Node::Directory) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write_file(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        let mut data = Vec::new();
        contents.read_to_end(&mut data)?;

        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                if !matches!(inner.nodes.get(parent), Some(Node::Directory)) {
                    return Err(not_found(parent));
                }
            }
            _ => {}
        }
        if matches!(inner.nodes.get(path), Some(Node::Directory)) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            ));
        }

        let written = data.len() as u64;
        inner.nodes.insert(
            path.to_path_buf(),
            Node::File {
                data,
                modified: SystemTime::now(),
            },
        );
        Ok(written)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match inner.nodes.get(path) {
            Some(Node::File { .. }) => {
                inner.nodes.remove(path);
                Ok(())
            }
            Some(Node::Directory) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_empty_dir(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        match inner.nodes.get(path) {
            Some(Node::Directory) => {
                if inner.nodes.keys().any(|p| p.parent() == Some(path)) {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("directory not empty: {}", path.display()),
                    ));
                }
                inner.nodes.remove(path);
                Ok(())
            }
            Some(Node::File { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().expect("memory fs lock poisoned");
        if inner.denied.contains(path) {
            return Err(denied_error(path));
        }
        if inner.nodes.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty()
                && !matches!(inner.nodes.get(parent), Some(Node::Directory))
            {
                return Err(not_found(parent));
            }
        }
        inner.nodes.insert(path.to_path_buf(), Node::Directory);
        Ok(())
    }
}
