//! Persistence for the site document.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    ContentStore                           │
//! │                                                           │
//! │   load() ──► fresh? ──yes──► cached Arc<Site> (ArcSwap)   │
//! │                 │                                         │
//! │                 no ──► Backend::load ► decode ► swap      │
//! │                                                           │
//! │   save(site) ──► encode ► Backend::save ► swap            │
//! └───────────────────────────┬───────────────────────────────┘
//!                             │ bytes in / bytes out
//!              ┌──────────────┴──────────────┐
//!              ▼                             ▼
//!        LocalStorage                   HttpStorage
//!        (site.json)                 (object store URL)
//! ```

mod http;
mod local;
#[cfg(test)]
pub mod memory;
mod store;

pub use http::HttpStorage;
pub use local::LocalStorage;
pub use store::{ContentStore, StoreError};

use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

/// Opaque byte blob get/set against durable storage.
pub trait Backend: Send + Sync {
    fn load(&self) -> Result<Vec<u8>, StorageError>;
    fn save(&self, bytes: &[u8]) -> Result<(), StorageError>;
}

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn load(&self) -> Result<Vec<u8>, StorageError> {
        (**self).load()
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).save(bytes)
    }
}

/// Backend I/O errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("request to `{0}` failed")]
    Http(String, #[source] reqwest::Error),

    #[error("`{0}` answered with status {1}")]
    Status(String, u16),
}
