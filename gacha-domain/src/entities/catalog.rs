// Catalog entity
// Static name -> item metadata table, read-only after load

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::value_objects::{ItemType, Rarity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub item_id: u32,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub item_type: ItemType,
    pub rarity: Rarity,
    /// Member of the permanent pool.
    #[serde(default)]
    pub standard: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_item_id: HashMap<u32, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, LedgerError> {
        let mut by_name = HashMap::new();
        let mut by_item_id = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if by_item_id.insert(entry.item_id, idx).is_some() {
                return Err(LedgerError::Format(format!(
                    "duplicate catalog item_id {}",
                    entry.item_id
                )));
            }
            for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                let key = normalize_name(name);
                if key.is_empty() {
                    continue;
                }
                if let Some(previous) = by_name.insert(key, idx) {
                    if previous != idx {
                        return Err(LedgerError::Format(format!(
                            "catalog name '{}' is ambiguous",
                            name
                        )));
                    }
                }
            }
        }
        Ok(Self {
            entries,
            by_name,
            by_item_id,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name
            .get(&normalize_name(name))
            .map(|idx| &self.entries[*idx])
    }

    pub fn by_item_id(&self, item_id: u32) -> Option<&CatalogEntry> {
        self.by_item_id.get(&item_id).map(|idx| &self.entries[*idx])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
pub(crate) fn test_catalog() -> Catalog {
    fn entry(item_id: u32, name: &str, alias: &str, item_type: ItemType, rarity: Rarity, standard: bool) -> CatalogEntry {
        CatalogEntry {
            item_id,
            name: name.to_string(),
            aliases: vec![alias.to_string()],
            item_type,
            rarity,
            standard,
        }
    }
    Catalog::new(vec![
        entry(1301, "Calcharo", "卡卡罗", ItemType::Character, Rarity::Five, true),
        entry(1503, "Verina", "维里奈", ItemType::Character, Rarity::Five, true),
        entry(1404, "Jiyan", "忌炎", ItemType::Character, Rarity::Five, false),
        entry(1302, "Yinlin", "吟霖", ItemType::Character, Rarity::Five, false),
        entry(1602, "Danjin", "丹瑾", ItemType::Character, Rarity::Four, false),
        entry(1402, "Yangyang", "秧秧", ItemType::Character, Rarity::Four, false),
        entry(1202, "Chixia", "炽霞", ItemType::Character, Rarity::Four, false),
        entry(1102, "Sanhua", "散华", ItemType::Character, Rarity::Four, false),
        entry(21010015, "Lustrous Razor", "浩境粼光", ItemType::Weapon, Rarity::Five, true),
        entry(21010016, "Verdant Summit", "苍鳞千嶂", ItemType::Weapon, Rarity::Five, false),
        entry(21010024, "Discord", "异响空灵", ItemType::Weapon, Rarity::Four, false),
        entry(21020013, "Sword of Night", "暗夜迅刀·黑闪", ItemType::Weapon, Rarity::Three, false),
    ])
    .expect("test catalog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_alias_aware() {
        let catalog = test_catalog();
        assert_eq!(catalog.lookup("calcharo").map(|e| e.item_id), Some(1301));
        assert_eq!(catalog.lookup(" 忌炎 ").map(|e| e.item_id), Some(1404));
        assert!(catalog.lookup("Rover").is_none());
        assert_eq!(
            catalog.by_item_id(21020013).map(|e| e.name.as_str()),
            Some("Sword of Night")
        );
    }

    #[test]
    fn ambiguous_alias_is_rejected() {
        let entries = vec![
            CatalogEntry {
                item_id: 1,
                name: "Alpha".to_string(),
                aliases: vec!["shared".to_string()],
                item_type: ItemType::Character,
                rarity: Rarity::Four,
                standard: false,
            },
            CatalogEntry {
                item_id: 2,
                name: "Beta".to_string(),
                aliases: vec!["Shared".to_string()],
                item_type: ItemType::Character,
                rarity: Rarity::Four,
                standard: false,
            },
        ];
        assert!(Catalog::new(entries).is_err());
    }
}
