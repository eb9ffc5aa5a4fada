//! Byte-stream access to persistent storage.
//!
//! Files are addressed by a path relative to the storage root. Closing a file is dropping
//! its reader or writer; writers should be flushed first so that errors are not lost.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Cursor, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::error::{Error, Result};

/// A flat file store supporting the access modes of the recorder and the trainer.
pub trait Storage {
    /// A buffered reader over one file.
    type Reader: io::BufRead;
    /// A writer into one file.
    type Writer: io::Write;

    /// Check whether a file exists.
    fn exists(&self, path: &Path) -> bool;

    /// Open an existing file for reading.
    fn open_read(&self, path: &Path) -> Result<Self::Reader>;

    /// Create or truncate a file for writing.
    fn open_write(&self, path: &Path) -> Result<Self::Writer>;

    /// Open a file for writing at its end, creating it if needed.
    fn open_append(&self, path: &Path) -> Result<Self::Writer>;

    /// Delete a file. Deleting a missing file is not an error.
    fn remove(&self, path: &Path) -> Result<()>;
}

/// Files in a directory of the host file system.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create a storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }
}

fn open_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Open {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

impl Storage for FsStorage {
    type Reader = BufReader<File>;
    type Writer = BufWriter<File>;

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn open_read(&self, path: &Path) -> Result<Self::Reader> {
        let file = File::open(self.resolve(path)).map_err(open_error(path))?;
        Ok(BufReader::new(file))
    }

    fn open_write(&self, path: &Path) -> Result<Self::Writer> {
        let file = File::create(self.resolve(path)).map_err(open_error(path))?;
        Ok(BufWriter::new(file))
    }

    fn open_append(&self, path: &Path) -> Result<Self::Writer> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.resolve(path))
            .map_err(open_error(path))?;
        Ok(BufWriter::new(file))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(self.resolve(path)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

type Files = Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>;

/// An in-memory store. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    files: Files,
}

impl MemStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the content of a file.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }
}

/// A writer appending to a file of a [`MemStorage`].
#[derive(Debug)]
pub struct MemWriter {
    files: Files,
    path: PathBuf,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.files
            .borrow_mut()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Storage for MemStorage {
    type Reader = Cursor<Vec<u8>>;
    type Writer = MemWriter;

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn open_read(&self, path: &Path) -> Result<Self::Reader> {
        self.contents(path)
            .map(Cursor::new)
            .ok_or_else(|| Error::NotFound(path.to_path_buf()))
    }

    fn open_write(&self, path: &Path) -> Result<Self::Writer> {
        self.files.borrow_mut().insert(path.to_path_buf(), Vec::new());
        self.open_append(path)
    }

    fn open_append(&self, path: &Path) -> Result<Self::Writer> {
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default();
        Ok(MemWriter {
            files: Rc::clone(&self.files),
            path: path.to_path_buf(),
        })
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files.borrow_mut().remove(path);
        Ok(())
    }
}
