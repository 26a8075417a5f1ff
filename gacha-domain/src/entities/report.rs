// Analyzer output entities

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::utils::{local_time, local_time_opt};
use crate::value_objects::{ItemType, PlayerId, PoolCategory, Rarity};

/// Counters right after a record was drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PityPoint {
    pub record_id: String,
    pub five: u32,
    pub four: u32,
}

/// A 4★ or 5★ hit with the number of draws it took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitRecord {
    pub record_id: String,
    pub name: String,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub category: PoolCategory,
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
    pub pity: u32,
    pub is_up: bool,
    /// Featured hit obtained while the guarantee was active.
    pub guaranteed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PityReport {
    pub player_id: PlayerId,
    pub category: PoolCategory,
    pub total: usize,
    pub five_pity: u32,
    pub four_pity: u32,
    /// `None` on banners without a 50/50 mechanic.
    pub next_five_guaranteed: Option<bool>,
    pub five_hits: Vec<HitRecord>,
    pub four_hits: Vec<HitRecord>,
    pub five_average: Option<f64>,
    pub up_average: Option<f64>,
    pub four_average: Option<f64>,
    #[serde(with = "local_time_opt")]
    pub first_draw: Option<NaiveDateTime>,
    #[serde(with = "local_time_opt")]
    pub last_draw: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowItem {
    pub name: String,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub count: u32,
    pub is_up: bool,
}

/// Draws that fall inside one pool definition's window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStats {
    pub pool_name: String,
    pub display_name: String,
    pub version: String,
    #[serde(with = "local_time")]
    pub from_time: NaiveDateTime,
    #[serde(with = "local_time")]
    pub to_time: NaiveDateTime,
    #[serde(with = "local_time_opt")]
    pub first_draw: Option<NaiveDateTime>,
    #[serde(with = "local_time_opt")]
    pub last_draw: Option<NaiveDateTime>,
    pub count: usize,
    pub items: Vec<WindowItem>,
    pub five_hits: Vec<HitRecord>,
    pub four_hits: Vec<HitRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiveStarEntry {
    pub name: String,
    pub item_type: ItemType,
    pub count: u32,
    pub pities: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiveStarOverview {
    pub player_id: PlayerId,
    pub total_draws: usize,
    pub five_count: usize,
    pub average_pity: Option<f64>,
    pub hits: Vec<HitRecord>,
    pub by_item: Vec<FiveStarEntry>,
}
