use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use gacha_domain::{Ledger, LedgerRepository, PlayerId, PlayerProfile, PoolCategory, Record};

use crate::utils::{read_if_exists, remove_if_exists, write_atomic};

const PROFILE_FILE: &str = "profile.json";

/// One JSON document per `(player, category)` under `{data_dir}/{player}/`.
pub struct LedgerFileRepository {
    data_dir: PathBuf,
}

#[derive(Deserialize)]
struct StoredLedger {
    player_id: PlayerId,
    category: PoolCategory,
    records: Vec<Record>,
}

impl LedgerFileRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn player_dir(&self, player: &PlayerId) -> anyhow::Result<PathBuf> {
        let id = player.as_str();
        if id.is_empty() || !id.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(anyhow!("refusing storage path for player id '{}'", id));
        }
        Ok(self.data_dir.join(id))
    }

    fn ledger_path(&self, player: &PlayerId, category: PoolCategory) -> anyhow::Result<PathBuf> {
        Ok(self
            .player_dir(player)?
            .join(format!("{}.json", category.as_str())))
    }

    async fn remove_dir_if_empty(&self, dir: &Path) {
        // fails while other files remain
        let _ = fs::remove_dir(dir).await;
    }
}

#[async_trait]
impl LedgerRepository for LedgerFileRepository {
    async fn load_ledger(
        &self,
        player: &PlayerId,
        category: PoolCategory,
    ) -> anyhow::Result<Option<Ledger>> {
        let path = self.ledger_path(player, category)?;
        let Some(bytes) = read_if_exists(&path).await? else {
            return Ok(None);
        };
        let stored: StoredLedger = serde_json::from_slice(&bytes)
            .with_context(|| format!("corrupt ledger file {}", path.display()))?;
        if &stored.player_id != player || stored.category != category {
            return Err(anyhow!(
                "ledger file {} belongs to {}/{}",
                path.display(),
                stored.player_id,
                stored.category
            ));
        }
        let ledger = Ledger::from_records(stored.player_id, stored.category, stored.records)
            .with_context(|| format!("invalid ledger file {}", path.display()))?;
        Ok(Some(ledger))
    }

    async fn save_ledger(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let path = self.ledger_path(&ledger.player_id, ledger.category)?;
        let content = serde_json::to_vec_pretty(ledger)?;
        write_atomic(&path, &content).await
    }

    async fn delete_ledger(&self, player: &PlayerId, category: PoolCategory) -> anyhow::Result<bool> {
        let path = self.ledger_path(player, category)?;
        let removed = remove_if_exists(&path).await?;
        self.remove_dir_if_empty(&self.player_dir(player)?).await;
        Ok(removed)
    }

    async fn load_profile(&self, player: &PlayerId) -> anyhow::Result<Option<PlayerProfile>> {
        let path = self.player_dir(player)?.join(PROFILE_FILE);
        let Some(bytes) = read_if_exists(&path).await? else {
            return Ok(None);
        };
        let profile = serde_json::from_slice(&bytes)
            .with_context(|| format!("corrupt profile file {}", path.display()))?;
        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &PlayerProfile) -> anyhow::Result<()> {
        let path = self.player_dir(&profile.player_id)?.join(PROFILE_FILE);
        let content = serde_json::to_vec_pretty(profile)?;
        write_atomic(&path, &content).await
    }

    async fn delete_profile(&self, player: &PlayerId) -> anyhow::Result<bool> {
        let dir = self.player_dir(player)?;
        let removed = remove_if_exists(&dir.join(PROFILE_FILE)).await?;
        self.remove_dir_if_empty(&dir).await;
        Ok(removed)
    }
}
