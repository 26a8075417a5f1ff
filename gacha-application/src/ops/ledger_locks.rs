use std::collections::HashMap;
use std::sync::Arc;

use gacha_domain::{PlayerId, PoolCategory};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Slots beyond this count are pruned of idle entries on the next acquire.
const PRUNE_THRESHOLD: usize = 1024;

/// `None` addresses the player profile.
type LockKey = (PlayerId, Option<PoolCategory>);

/// One async mutex per `(player, category)` ledger plus one per profile.
/// Writers to different keys never wait on each other.
#[derive(Default)]
pub struct LedgerLocks {
    slots: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LedgerLocks {
    async fn slot(&self, key: LockKey) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().await;
        if slots.len() > PRUNE_THRESHOLD {
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn acquire(&self, player: &PlayerId, category: PoolCategory) -> OwnedMutexGuard<()> {
        self.slot((player.clone(), Some(category)))
            .await
            .lock_owned()
            .await
    }

    /// Fails fast instead of queueing behind a running write.
    pub async fn try_acquire(
        &self,
        player: &PlayerId,
        category: PoolCategory,
    ) -> Option<OwnedMutexGuard<()>> {
        self.slot((player.clone(), Some(category)))
            .await
            .try_lock_owned()
            .ok()
    }

    /// Every category ledger of `player`, taken in [`PoolCategory::ALL`] order.
    pub async fn acquire_all(&self, player: &PlayerId) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::with_capacity(PoolCategory::ALL.len());
        for category in PoolCategory::ALL {
            guards.push(self.acquire(player, category).await);
        }
        guards
    }

    pub async fn acquire_profile(&self, player: &PlayerId) -> OwnedMutexGuard<()> {
        self.slot((player.clone(), None)).await.lock_owned().await
    }
}
