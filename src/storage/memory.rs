//! In-memory entity store.
//!
//! Intended for tests: counts calls and can be switched into a failing mode.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Entity, EntityStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<BTreeMap<i64, String>>,
    inserts: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows`.
    pub fn with_rows<'a>(rows: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        let map = rows
            .into_iter()
            .map(|(id, data)| (id, data.to_string()))
            .collect();
        Self {
            rows: Mutex::new(map),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of insert calls received, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn lock_rows(&self) -> Result<MutexGuard<'_, BTreeMap<i64, String>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("row lock poisoned".into()))
    }
}

impl EntityStore for InMemoryStore {
    fn insert(&self, id: &str, data: &str) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let id: i64 = id
            .parse()
            .map_err(|_| StoreError::Unavailable(format!("invalid id: {id}")))?;
        let mut rows = self.lock_rows()?;
        if rows.contains_key(&id) {
            return Err(StoreError::Unavailable(format!("duplicate id: {id}")));
        }
        rows.insert(id, data.to_string());
        Ok(())
    }

    fn select_all(&self) -> Result<Vec<Entity>, StoreError> {
        self.check_available()?;
        let rows = self.lock_rows()?;
        Ok(rows
            .iter()
            .map(|(id, data)| Entity::new(id.to_string(), data.clone()))
            .collect())
    }
}
