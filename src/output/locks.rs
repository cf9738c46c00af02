//! Process-wide exclusion per target path.
//!
//! Concurrent evaluations may target the same file; commits to one path
//! are serialized through the lock returned by [`path_lock`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static PATH_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(Default::default);

/// Returns the lock guarding `path`. Hold its guard for the whole read-format-write cycle.
pub fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    // Locks nobody else holds can be recreated on demand.
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    Arc::clone(locks.entry(path.to_path_buf()).or_default())
}
