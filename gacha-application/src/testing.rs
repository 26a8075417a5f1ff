// In-memory doubles for command and query tests

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use gacha_domain::formats::live::LiveHistory;
use gacha_domain::ports::{LedgerRepository, LiveHistorySource};
use gacha_domain::{
    parse_time, Catalog, CatalogEntry, ItemType, Ledger, PlayerId, PlayerProfile, PoolCatalog,
    PoolCategory, PoolDefinition, Rarity, RuntimeConfig,
};
use tokio::sync::Mutex;

use crate::AppState;

#[derive(Default)]
pub struct MemoryLedgerRepository {
    ledgers: Mutex<HashMap<(PlayerId, PoolCategory), Ledger>>,
    profiles: Mutex<HashMap<PlayerId, PlayerProfile>>,
    failing: Mutex<HashSet<(PlayerId, PoolCategory)>>,
}

impl MemoryLedgerRepository {
    pub async fn fail_saves_for(&self, player: &PlayerId, category: PoolCategory) {
        self.failing.lock().await.insert((player.clone(), category));
    }

    pub async fn ledger(&self, player: &PlayerId, category: PoolCategory) -> Option<Ledger> {
        self.ledgers
            .lock()
            .await
            .get(&(player.clone(), category))
            .cloned()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepository {
    async fn load_ledger(
        &self,
        player: &PlayerId,
        category: PoolCategory,
    ) -> anyhow::Result<Option<Ledger>> {
        Ok(self.ledger(player, category).await)
    }

    async fn save_ledger(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let key = (ledger.player_id.clone(), ledger.category);
        if self.failing.lock().await.contains(&key) {
            anyhow::bail!("simulated write failure for {}", ledger.category);
        }
        self.ledgers.lock().await.insert(key, ledger.clone());
        Ok(())
    }

    async fn delete_ledger(&self, player: &PlayerId, category: PoolCategory) -> anyhow::Result<bool> {
        Ok(self
            .ledgers
            .lock()
            .await
            .remove(&(player.clone(), category))
            .is_some())
    }

    async fn load_profile(&self, player: &PlayerId) -> anyhow::Result<Option<PlayerProfile>> {
        Ok(self.profiles.lock().await.get(player).cloned())
    }

    async fn save_profile(&self, profile: &PlayerProfile) -> anyhow::Result<()> {
        self.profiles
            .lock()
            .await
            .insert(profile.player_id.clone(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, player: &PlayerId) -> anyhow::Result<bool> {
        Ok(self.profiles.lock().await.remove(player).is_some())
    }
}

pub struct StaticLiveSource(pub LiveHistory);

#[async_trait]
impl LiveHistorySource for StaticLiveSource {
    async fn fetch(&self, _player: &PlayerId) -> anyhow::Result<LiveHistory> {
        Ok(self.0.clone())
    }
}

pub fn catalog() -> Catalog {
    let entry = |item_id: u32, name: &str, item_type: ItemType, rarity: Rarity, standard: bool| CatalogEntry {
        item_id,
        name: name.to_string(),
        aliases: Vec::new(),
        item_type,
        rarity,
        standard,
    };
    Catalog::new(vec![
        entry(1301, "Calcharo", ItemType::Character, Rarity::Five, true),
        entry(1404, "Jiyan", ItemType::Character, Rarity::Five, false),
        entry(1602, "Danjin", ItemType::Character, Rarity::Four, false),
        entry(1402, "Yangyang", ItemType::Character, Rarity::Four, false),
        entry(1202, "Chixia", ItemType::Character, Rarity::Four, false),
        entry(21010024, "Discord", ItemType::Weapon, Rarity::Four, false),
        entry(21020013, "Sword of Night", ItemType::Weapon, Rarity::Three, false),
    ])
    .expect("catalog")
}

pub fn pools() -> PoolCatalog {
    PoolCatalog::new(vec![PoolDefinition {
        name: "Prevail the Lasting Night".to_string(),
        version: "1.0".to_string(),
        category: PoolCategory::Character,
        five: vec!["Jiyan".to_string()],
        four: vec!["Danjin".to_string(), "Chixia".to_string(), "Yangyang".to_string()],
        from_time: parse_time("2024-05-23 10:00:00").expect("from"),
        to_time: parse_time("2024-06-13 09:59:59").expect("to"),
    }])
    .expect("pools")
}

pub fn state() -> (AppState, Arc<MemoryLedgerRepository>) {
    let repo = Arc::new(MemoryLedgerRepository::default());
    let state = AppState::new(RuntimeConfig::default(), repo.clone(), catalog(), pools());
    (state, repo)
}

pub fn player(id: &str) -> PlayerId {
    PlayerId(id.to_string())
}

/// Interchange payload with `(id, name, code, item_type, rank, time)` rows.
pub fn interchange(uid: &str, rows: &[(&str, &str, &str, &str, u8, &str)]) -> Vec<u8> {
    let list: Vec<serde_json::Value> = rows
        .iter()
        .map(|(id, name, code, item_type, rank, time)| {
            serde_json::json!({
                "id": id,
                "name": name,
                "count": "1",
                "gacha_type": code,
                "item_type": item_type,
                "rank_type": rank.to_string(),
                "time": time,
                "uimf_gacha_type": code,
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "info": {"uid": uid, "lang": "zh-cn", "uimf_version": "v1.1", "region_time_zone": 8},
        "list": list,
    }))
    .expect("payload")
}

/// Legacy table with `(time, name, item_type, rarity, banner)` rows.
pub fn legacy(uid: &str, rows: &[(&str, &str, &str, u8, &str)]) -> Vec<u8> {
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .map(|(time, name, item_type, rarity, banner)| serde_json::json!([time, name, item_type, rarity, banner]))
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "uid": uid,
        "columns": ["时间", "名称", "类别", "星级", "唤取类型"],
        "rows": rows,
    }))
    .expect("payload")
}
