// Item type value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Character,
    Weapon,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Character => "character",
            ItemType::Weapon => "weapon",
        }
    }

    /// Label used by the interchange and legacy formats.
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Character => "角色",
            ItemType::Weapon => "武器",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "角色" | "character" | "resonator" | "resonators" => Some(ItemType::Character),
            "武器" | "weapon" | "weapons" => Some(ItemType::Weapon),
            _ => None,
        }
    }
}
