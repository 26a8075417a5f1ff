use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use gacha_domain::{Catalog, CatalogEntry, MetadataRepository, PoolCatalog, PoolDefinition};

const BUNDLED_CATALOG: &str = include_str!("../../data/catalog.json");
const BUNDLED_POOLS: &str = include_str!("../../data/pools.yaml");

/// Catalog (JSON) and pool definitions (YAML); bundled copies when no path is set.
#[derive(Default)]
pub struct MetadataFileRepository;

impl MetadataFileRepository {
    pub fn new() -> Self {
        Self
    }
}

pub fn parse_catalog(content: &str) -> anyhow::Result<Catalog> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(content)?;
    Ok(Catalog::new(entries)?)
}

pub fn parse_pools(content: &str) -> anyhow::Result<PoolCatalog> {
    let pools: Vec<PoolDefinition> = serde_yaml::from_str(content)?;
    Ok(PoolCatalog::new(pools)?)
}

#[async_trait]
impl MetadataRepository for MetadataFileRepository {
    async fn load_catalog(&self, path: Option<&str>) -> anyhow::Result<Catalog> {
        let catalog = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read catalog {}", path))?;
                parse_catalog(&content).with_context(|| format!("invalid catalog {}", path))?
            }
            None => parse_catalog(BUNDLED_CATALOG).context("invalid bundled catalog")?,
        };
        info!("catalog loaded: {} entries", catalog.len());
        Ok(catalog)
    }

    async fn load_pools(&self, path: Option<&str>) -> anyhow::Result<PoolCatalog> {
        let pools = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read pool definitions {}", path))?;
                parse_pools(&content).with_context(|| format!("invalid pool definitions {}", path))?
            }
            None => parse_pools(BUNDLED_POOLS).context("invalid bundled pool definitions")?,
        };
        info!("pool definitions loaded: {} pools", pools.len());
        Ok(pools)
    }
}
