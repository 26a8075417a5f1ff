use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use gacha_application::AppState;
use gacha_domain::MetadataRepository;
use gacha_infrastructure::{AppConfig, LedgerFileRepository, MetadataFileRepository};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();

        let metadata = MetadataFileRepository::new();
        let catalog = metadata
            .load_catalog(runtime_config.catalog_path.as_deref())
            .await?;
        let pools = metadata
            .load_pools(runtime_config.pools_path.as_deref())
            .await?;
        info!(
            "metadata loaded: {} catalog entries, {} pool windows",
            catalog.len(),
            pools.len()
        );

        let repo = Arc::new(LedgerFileRepository::new(runtime_config.data_dir.clone()));
        let state = AppState::new(runtime_config, repo, catalog, pools);

        Ok(Self { state })
    }
}
