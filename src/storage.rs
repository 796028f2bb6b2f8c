//! Filesystem seam for the pipeline stages.
//!
//! Stages never touch `std::fs` directly; they go through [`Storage`]. [`FsStorage`] is the real
//! disk, [`MemStorage`] keeps everything in memory for tests and dry runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Storage contract used by collectors, the compositor and the assembler.
pub trait Storage {
    /// Return `true` when a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    /// Read the whole file at `path`.
    fn read(&self, path: &Path) -> RevlapseResult<Vec<u8>>;
    /// Create or replace the file at `path`.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> RevlapseResult<()>;
    /// Create `path` and all missing parents; succeeds if it already exists.
    fn create_dir_all(&mut self, path: &Path) -> RevlapseResult<()>;
    /// Files directly inside `dir`, sorted. A missing directory lists as empty.
    fn list_dir(&self, dir: &Path) -> RevlapseResult<Vec<PathBuf>>;
    /// Delete the file at `path`.
    fn remove(&mut self, path: &Path) -> RevlapseResult<()>;
}

/// [`Storage`] backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> RevlapseResult<Vec<u8>> {
        Ok(std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?)
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> RevlapseResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory '{}'", parent.display()))?;
        }
        std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        Ok(())
    }

    fn create_dir_all(&mut self, path: &Path) -> RevlapseResult<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("create directory '{}'", path.display()))?;
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> RevlapseResult<Vec<PathBuf>> {
        let read_from = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let entries = match std::fs::read_dir(read_from) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("list directory '{}'", dir.display()))
                    .into());
            }
        };
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("list directory '{}'", dir.display()))?;
            if entry.file_type().is_ok_and(|t| t.is_file()) {
                files.push(dir.join(entry.file_name()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn remove(&mut self, path: &Path) -> RevlapseResult<()> {
        std::fs::remove_file(path).with_context(|| format!("remove '{}'", path.display()))?;
        Ok(())
    }
}

/// In-memory [`Storage`] for tests and debugging.
#[derive(Clone, Debug, Default)]
pub struct MemStorage {
    files: BTreeMap<PathBuf, Vec<u8>>,
    writes: usize,
}

impl MemStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all stored files, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Number of `write` calls since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }

}

impl Storage for MemStorage {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> RevlapseResult<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            RevlapseError::evaluation(format!("no such file '{}'", path.display()))
        })
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> RevlapseResult<()> {
        self.writes += 1;
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn create_dir_all(&mut self, _path: &Path) -> RevlapseResult<()> {
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> RevlapseResult<Vec<PathBuf>> {
        Ok(self
            .paths()
            .filter(|p| p.parent() == Some(dir))
            .map(Path::to_path_buf)
            .collect())
    }

    fn remove(&mut self, path: &Path) -> RevlapseResult<()> {
        self.files.remove(path).map(|_| ()).ok_or_else(|| {
            RevlapseError::evaluation(format!("no such file '{}'", path.display()))
        })
    }
}
