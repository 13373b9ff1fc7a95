// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user serialization of intents.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutex: one lock per Telegram user ID.
///
/// Intents of one user run one at a time in arrival order (tokio's mutex is
/// fair); intents of different users never wait on each other.
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: DashMap<i64, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the user's lock. The guard releases it on drop.
    pub async fn acquire(&self, telegram_id: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .inner
            .entry(telegram_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops the entry when nobody holds or waits for it.
    pub fn release_idle(&self, telegram_id: i64) {
        self.inner
            .remove_if(&telegram_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire(42).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(42).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "second intent must wait");

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(1).await;
        tokio::time::timeout(Duration::from_millis(100), locks.acquire(2))
            .await
            .expect("user 2 should not wait for user 1");
    }

    #[tokio::test]
    async fn idle_entries_are_released() {
        let locks = UserLocks::new();
        let guard = locks.acquire(1).await;
        locks.release_idle(1);
        assert_eq!(locks.len(), 1, "held lock must stay");
        drop(guard);
        locks.release_idle(1);
        assert!(locks.is_empty());
    }
}
