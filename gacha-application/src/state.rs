use std::sync::Arc;

use gacha_domain::ports::LedgerRepository;
use gacha_domain::{Catalog, PityAnalyzer, PoolCatalog, RuntimeConfig};

use crate::ops::LedgerLocks;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub ledger_repo: Arc<dyn LedgerRepository>,
    pub catalog: Arc<Catalog>,
    pub pools: Arc<PoolCatalog>,
    pub locks: Arc<LedgerLocks>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        ledger_repo: Arc<dyn LedgerRepository>,
        catalog: Catalog,
        pools: PoolCatalog,
    ) -> Self {
        Self {
            config,
            ledger_repo,
            catalog: Arc::new(catalog),
            pools: Arc::new(pools),
            locks: Arc::new(LedgerLocks::default()),
            metrics: Arc::new(Metrics::default()),
        }
    }

    pub fn analyzer(&self) -> PityAnalyzer<'_> {
        PityAnalyzer::new(&self.catalog, &self.pools)
    }
}
