//! Per-key write serialization.
//!
//! The uniqueness check and the subsequent insert are separate storage
//! operations, so two concurrent registrations for the same username could
//! both pass the check. Writers take this lock on every identity key they are
//! about to claim; the store's unique indexes remain the hard backstop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
pub struct RegistrationLock {
    handles: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Holds every acquired key mutex until dropped.
pub struct RegistrationGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl RegistrationLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    async fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        let mut handles = self.handles.lock().await;
        // Sweep handles nobody else holds, otherwise the map grows one entry
        // per distinct key ever locked.
        handles.retain(|_, handle| Arc::strong_count(handle) > 1);
        handles.entry(key.to_string()).or_default().clone()
    }

    /// Locks every non-empty key. Keys are normalized, deduplicated and
    /// acquired in sorted order so overlapping key sets cannot deadlock.
    pub async fn acquire<I, S>(&self, keys: I) -> RegistrationGuard
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<String> = keys
            .into_iter()
            .map(|k| Self::normalize(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            let handle = self.handle(&key).await;
            guards.push(handle.lock_owned().await);
        }

        RegistrationGuard { _guards: guards }
    }

    #[cfg(test)]
    async fn key_count(&self) -> usize {
        self.handles.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_serializes() {
        let lock = RegistrationLock::new();

        let guard = lock.acquire(["Alice"]).await;

        // Case-insensitive: "alice" contends with "Alice".
        let contended = tokio::time::timeout(
            Duration::from_millis(50),
            lock.acquire(["alice"]),
        )
        .await;
        assert!(contended.is_err());

        drop(guard);
        let _ = tokio::time::timeout(Duration::from_millis(50), lock.acquire(["alice"]))
            .await
            .expect("lock should be free after guard drop");
    }

    #[tokio::test]
    async fn disjoint_keys_do_not_block() {
        let lock = RegistrationLock::new();
        let _a = lock.acquire(["alice"]).await;
        let _ = tokio::time::timeout(Duration::from_millis(50), lock.acquire(["bob"]))
            .await
            .expect("disjoint key should not block");
    }

    #[tokio::test]
    async fn released_keys_do_not_accumulate() {
        let lock = RegistrationLock::new();
        for i in 0..100 {
            let _ = lock.acquire([format!("user-{i}")]).await;
        }

        // Every earlier handle is free again; the next acquisition sweeps
        // them, leaving only the key it takes itself.
        let _guard = lock.acquire(["alice"]).await;
        assert_eq!(lock.key_count().await, 1);
    }

    #[tokio::test]
    async fn held_keys_survive_the_sweep() {
        let lock = RegistrationLock::new();
        let _held = lock.acquire(["alice"]).await;
        let _other = lock.acquire(["bob"]).await;

        let contended = tokio::time::timeout(
            Duration::from_millis(50),
            lock.acquire(["alice"]),
        )
        .await;
        assert!(contended.is_err());
    }

    #[tokio::test]
    async fn duplicate_and_empty_keys_are_collapsed() {
        let lock = RegistrationLock::new();
        // Would deadlock on itself if duplicates were acquired twice.
        let _ = lock.acquire(["alice", "ALICE", "", "  "]).await;
    }
}
