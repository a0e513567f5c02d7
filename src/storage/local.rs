//! Site document stored as a file on the local filesystem.

use super::{Backend, StorageError};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file used for write-then-rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for LocalStorage {
    fn load(&self) -> Result<Vec<u8>, StorageError> {
        fs::read(&self.path).map_err(|err| StorageError::Io(self.path.clone(), err))
    }

    /// Write to a temp file, then rename over the target so readers never
    /// see a half-written document.
    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| StorageError::Io(parent.to_path_buf(), err))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, bytes).map_err(|err| StorageError::Io(tmp.clone(), err))?;
        fs::rename(&tmp, &self.path).map_err(|err| StorageError::Io(self.path.clone(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("site.json"));

        storage.save(b"{}").unwrap();
        assert_eq!(storage.load().unwrap(), b"{}");

        storage.save(b"{\"title\":\"x\"}").unwrap();
        assert_eq!(storage.load().unwrap(), b"{\"title\":\"x\"}");
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested/storage/site.json"));

        storage.save(b"{}").unwrap();
        assert!(storage.path().is_file());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("missing.json"));

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Io(..)));
        assert!(err.to_string().contains("missing.json"));
    }
}
