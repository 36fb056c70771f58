//! In-memory [`FrameStore`] used by tests and dry runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::FrameStore;
use crate::error::ScanResult;

/// Artifacts kept in a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // a panicking writer cannot leave a half-inserted entry behind
        self.artifacts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sorted artifact names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl FrameStore for MemoryStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> ScanResult<()> {
        self.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, name: &str) -> ScanResult<Option<Vec<u8>>> {
        Ok(self.lock().get(name).cloned())
    }

    async fn exists(&self, name: &str) -> ScanResult<bool> {
        Ok(self.lock().contains_key(name))
    }

    async fn remove(&self, name: &str) -> ScanResult<()> {
        self.lock().remove(name);
        Ok(())
    }
}
