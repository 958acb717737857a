//! `std::fs`-backed implementation of the [`Filesystem`] trait.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::{FileKind, FileStat, Filesystem};

/// The real local filesystem (local disk or any mounted volume).
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path)? {
            children.push(entry?.path());
        }
        children.sort();
        Ok(children)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        // symlink_metadata so links are reported as links, not followed
        let metadata = fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Directory
        } else if file_type.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };

        Ok(FileStat {
            kind,
            size: if kind == FileKind::File { metadata.len() } else { 0 },
            modified: metadata.modified().ok(),
        })
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }

    fn write_file(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        let mut file = File::create(path)?;
        io::copy(contents, &mut file)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_empty_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }
}
