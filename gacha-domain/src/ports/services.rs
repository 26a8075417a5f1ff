use async_trait::async_trait;

use crate::formats::live::LiveHistory;
use crate::value_objects::PlayerId;

/// Hands over a player's history as the upstream API returned it.
/// Fetching, retries and auth live behind this trait.
#[async_trait]
pub trait LiveHistorySource: Send + Sync {
    async fn fetch(&self, player: &PlayerId) -> anyhow::Result<LiveHistory>;
}
