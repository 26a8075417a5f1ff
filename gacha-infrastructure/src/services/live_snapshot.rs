use std::path::Path;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tokio::fs;

use gacha_domain::formats::live::{self, LiveHistory};
use gacha_domain::{LiveHistorySource, PlayerId};

/// Serves upstream responses the API client already captured.
///
/// A fetch returns the snapshot whose `playerId` matches the request, or
/// failing that the first one captured. The importer's identity check then
/// reports a snapshot that belongs to someone else.
#[derive(Debug, Default, Clone)]
pub struct SnapshotLiveSource {
    snapshots: Vec<LiveHistory>,
}

impl SnapshotLiveSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, history: LiveHistory) {
        match self
            .snapshots
            .iter_mut()
            .find(|held| held.player_id.trim() == history.player_id.trim())
        {
            Some(held) => *held = history,
            None => self.snapshots.push(history),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let mut source = Self::new();
        source.insert(live::parse(bytes)?);
        Ok(source)
    }

    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("failed to read live snapshot {}", path.display()))?;
        Self::from_bytes(&bytes)
    }
}

#[async_trait]
impl LiveHistorySource for SnapshotLiveSource {
    async fn fetch(&self, player: &PlayerId) -> anyhow::Result<LiveHistory> {
        self.snapshots
            .iter()
            .find(|history| history.player_id.trim() == player.as_str())
            .or_else(|| self.snapshots.first())
            .cloned()
            .ok_or_else(|| anyhow!("no captured live response to serve player {}", player))
    }
}
