//! In-memory backend that counts I/O, for tests.

use super::{Backend, StorageError};
use parking_lot::Mutex;
use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<Vec<u8>>,
    loads: AtomicUsize,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(data.into()),
            ..Default::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// Replace the stored bytes behind the store's back.
    pub fn set(&self, data: impl Into<Vec<u8>>) {
        *self.data.lock() = data.into();
    }

    /// Make every following load and save fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn fail_if_needed(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io(
                PathBuf::from("memory"),
                io::Error::other("backend unavailable"),
            ));
        }
        Ok(())
    }
}

impl Backend for MemoryStorage {
    fn load(&self) -> Result<Vec<u8>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.fail_if_needed()?;
        Ok(self.contents())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.fail_if_needed()?;
        self.set(bytes);
        Ok(())
    }
}
