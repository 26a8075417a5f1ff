use async_trait::async_trait;

use crate::entities::{Catalog, Ledger, PlayerProfile, PoolCatalog};
use crate::value_objects::{PlayerId, PoolCategory};

/// Ledger persistence addressed by `(player, category)`.
///
/// Callers serialize writes per key; implementations only need to make a
/// single save atomic.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn load_ledger(
        &self,
        player: &PlayerId,
        category: PoolCategory,
    ) -> anyhow::Result<Option<Ledger>>;
    async fn save_ledger(&self, ledger: &Ledger) -> anyhow::Result<()>;
    /// Returns whether anything was removed.
    async fn delete_ledger(&self, player: &PlayerId, category: PoolCategory) -> anyhow::Result<bool>;

    async fn load_profile(&self, player: &PlayerId) -> anyhow::Result<Option<PlayerProfile>>;
    async fn save_profile(&self, profile: &PlayerProfile) -> anyhow::Result<()>;
    async fn delete_profile(&self, player: &PlayerId) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn load_catalog(&self, path: Option<&str>) -> anyhow::Result<Catalog>;
    async fn load_pools(&self, path: Option<&str>) -> anyhow::Result<PoolCatalog>;
}
