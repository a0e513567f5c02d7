//! Cached, write-through access to the site document.
//!
//! Reads are lock-free while the cached copy is fresh: an `ArcSwap` load
//! plus two cheap checks. A copy is fresh while it is younger than the TTL
//! and no forced reload is pending. Reloads and saves take the I/O mutex,
//! so at most one thread talks to the backend at a time and a burst of
//! stale readers causes a single reload.
//!
//! The cached `Arc<Site>` is never mutated in place; it is only ever
//! replaced, after a successful decode or a successful save.

use super::{Backend, StorageError};
use crate::{log, model::Site};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site storage unavailable")]
    Backend(#[from] StorageError),

    #[error("site document is not valid")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode site document")]
    Encode(#[source] serde_json::Error),

    #[error("timed out waiting for site storage")]
    DeadlineExceeded,
}

/// A decoded snapshot and when it was read or written.
struct Cached {
    site: Arc<Site>,
    at: Instant,
}

impl Cached {
    fn new(site: Site) -> Self {
        Self {
            site: Arc::new(site),
            at: Instant::now(),
        }
    }
}

pub struct ContentStore {
    backend: Box<dyn Backend>,
    cache: ArcSwap<Cached>,
    /// One-shot forced reload flag, consumed by exactly one reload.
    reload: AtomicBool,
    /// Serializes every backend read and write.
    io: Mutex<()>,
    ttl: Duration,
    /// Indent the persisted JSON (local development).
    pretty: bool,
}

impl ContentStore {
    /// Build the store and perform the first load.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot be read or the document does not decode;
    /// there is no usable store without a first snapshot.
    pub fn new(backend: impl Backend + 'static, ttl: Duration, pretty: bool) -> Result<Self, StoreError> {
        let backend: Box<dyn Backend> = Box::new(backend);
        let site = fetch(backend.as_ref())?;

        Ok(Self {
            backend,
            cache: ArcSwap::from_pointee(Cached::new(site)),
            reload: AtomicBool::new(false),
            io: Mutex::new(()),
            ttl,
            pretty,
        })
    }

    /// Current site, reloading first if the cached copy is stale.
    pub fn load(&self) -> Result<Arc<Site>, StoreError> {
        self.load_by(None)
    }

    /// Like [`load`](Self::load), giving up on waiting for an in-flight
    /// reload or save once `deadline` passes.
    ///
    /// # Errors
    ///
    /// A failed reload returns the error. The last good snapshot stays
    /// cached and a pending forced reload stays armed, so the next call
    /// retries the backend.
    pub fn load_by(&self, deadline: Option<Instant>) -> Result<Arc<Site>, StoreError> {
        {
            let cached = self.cache.load();
            if !self.reload.load(Ordering::Acquire) && cached.at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.site));
            }
        }

        let _io = self.lock_io(deadline)?;
        self.current_locked()
    }

    /// Persist `site` and make it the cached snapshot.
    ///
    /// The whole document is replaced; two saves built from the same stale
    /// snapshot lose whichever landed first. Use [`update`](Self::update)
    /// for read-modify-write.
    pub fn save(&self, site: Site) -> Result<Arc<Site>, StoreError> {
        self.save_by(site, None)
    }

    pub fn save_by(&self, site: Site, deadline: Option<Instant>) -> Result<Arc<Site>, StoreError> {
        let _io = self.lock_io(deadline)?;
        self.persist_locked(site)
    }

    /// Serialized read-modify-write of the document.
    ///
    /// `edit` runs on a private copy of the current site while the I/O lock
    /// is held. Returning `None` leaves the document untouched and skips the
    /// write.
    pub fn update<R>(
        &self,
        deadline: Option<Instant>,
        edit: impl FnOnce(&mut Site) -> Option<R>,
    ) -> Result<Option<R>, StoreError> {
        let _io = self.lock_io(deadline)?;
        let current = self.current_locked()?;

        let mut site = Site::clone(&current);
        let Some(out) = edit(&mut site) else {
            return Ok(None);
        };
        self.persist_locked(site)?;
        Ok(Some(out))
    }

    /// Force the next load to go to the backend, once.
    pub fn invalidate_site(&self) {
        self.reload.store(true, Ordering::Release);
    }

    /// Last cached snapshot without any freshness check or backend access.
    pub fn snapshot(&self) -> Arc<Site> {
        Arc::clone(&self.cache.load().site)
    }

    fn lock_io(&self, deadline: Option<Instant>) -> Result<MutexGuard<'_, ()>, StoreError> {
        match deadline {
            Some(deadline) => self
                .io
                .try_lock_until(deadline)
                .ok_or(StoreError::DeadlineExceeded),
            None => Ok(self.io.lock()),
        }
    }

    /// Fresh snapshot, reloading if needed. Caller holds the I/O lock.
    fn current_locked(&self) -> Result<Arc<Site>, StoreError> {
        let forced = self.reload.swap(false, Ordering::AcqRel);
        let cached = self.cache.load_full();

        // Another thread may have reloaded while this one waited for the lock.
        if !forced && cached.at.elapsed() < self.ttl {
            return Ok(Arc::clone(&cached.site));
        }

        match fetch(self.backend.as_ref()) {
            Ok(site) => Ok(self.replace(site)),
            Err(err) => {
                if forced {
                    self.reload.store(true, Ordering::Release);
                }
                log!("store"; "reload failed, keeping last good copy: {err}");
                Err(err)
            }
        }
    }

    /// Write through and swap the cache. Caller holds the I/O lock.
    fn persist_locked(&self, site: Site) -> Result<Arc<Site>, StoreError> {
        let bytes = self.encode(&site)?;
        self.backend.save(&bytes)?;
        Ok(self.replace(site))
    }

    fn replace(&self, site: Site) -> Arc<Site> {
        let cached = Cached::new(site);
        let site = Arc::clone(&cached.site);
        self.cache.store(Arc::new(cached));
        site
    }

    fn encode(&self, site: &Site) -> Result<Vec<u8>, StoreError> {
        if !self.pretty {
            return serde_json::to_vec(site).map_err(StoreError::Encode);
        }

        let mut buf = Vec::with_capacity(4096);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        site.serialize(&mut ser).map_err(StoreError::Encode)?;
        Ok(buf)
    }
}

/// Read and decode the document, filling in load-time defaults.
fn fetch(backend: &dyn Backend) -> Result<Site, StoreError> {
    let bytes = backend.load()?;
    let mut site: Site = serde_json::from_slice(&bytes).map_err(StoreError::Decode)?;
    site.apply_defaults();
    Ok(site)
}
