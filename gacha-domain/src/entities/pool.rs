// Pool definition entity
// Banner windows with their featured ("up") items

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::{Catalog, Record};
use crate::error::LedgerError;
use crate::utils::local_time;
use crate::value_objects::{PoolCategory, Rarity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDefinition {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub category: PoolCategory,
    #[serde(default)]
    pub five: Vec<String>,
    #[serde(default)]
    pub four: Vec<String>,
    #[serde(rename = "from", with = "local_time")]
    pub from_time: NaiveDateTime,
    #[serde(rename = "to", with = "local_time")]
    pub to_time: NaiveDateTime,
}

impl PoolDefinition {
    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        self.from_time <= *time && *time <= self.to_time
    }

    /// Display name joining the featured 5★ items.
    pub fn display_name(&self) -> String {
        if self.five.is_empty() {
            self.name.clone()
        } else {
            self.five.join("、")
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolCatalog {
    pools: Vec<PoolDefinition>,
}

impl PoolCatalog {
    pub fn new(mut pools: Vec<PoolDefinition>) -> Result<Self, LedgerError> {
        for pool in &pools {
            if pool.from_time > pool.to_time {
                return Err(LedgerError::Format(format!(
                    "pool '{}' ends before it starts",
                    pool.name
                )));
            }
        }
        pools.sort_by_key(|pool| pool.from_time);
        Ok(Self { pools })
    }

    pub fn pools(&self) -> &[PoolDefinition] {
        &self.pools
    }

    pub fn for_category(&self, category: PoolCategory) -> impl Iterator<Item = &PoolDefinition> {
        self.pools.iter().filter(move |pool| pool.category == category)
    }

    /// Pools of `category` whose window covers `time`. Reruns can overlap.
    pub fn covering<'a>(
        &'a self,
        category: PoolCategory,
        time: &'a NaiveDateTime,
    ) -> impl Iterator<Item = &'a PoolDefinition> {
        self.for_category(category).filter(move |pool| pool.contains(time))
    }

    /// Whether `record` was a featured item of a pool running at draw time.
    /// Without a covering window a 5★ outside the permanent pool counts as featured.
    pub fn is_up(&self, record: &Record, catalog: &Catalog) -> bool {
        let mut covered = false;
        for pool in self.covering(record.pool_category, &record.time) {
            covered = true;
            let featured = match record.rarity {
                Rarity::Five => &pool.five,
                Rarity::Four => &pool.four,
                Rarity::Three => return false,
            };
            if featured.iter().any(|name| name == &record.name) {
                return true;
            }
        }
        if covered || record.rarity != Rarity::Five {
            return false;
        }
        catalog
            .lookup(&record.name)
            .map(|entry| !entry.standard)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_pools() -> PoolCatalog {
    use crate::utils::parse_time;

    let pool = |name: &str, category, five: &[&str], four: &[&str], from: &str, to: &str| PoolDefinition {
        name: name.to_string(),
        version: "1.0".to_string(),
        category,
        five: five.iter().map(|s| s.to_string()).collect(),
        four: four.iter().map(|s| s.to_string()).collect(),
        from_time: parse_time(from).expect("from"),
        to_time: parse_time(to).expect("to"),
    };
    PoolCatalog::new(vec![
        pool(
            "When Thunder Pours",
            PoolCategory::Character,
            &["Yinlin"],
            &["Danjin", "Chixia", "Sanhua"],
            "2024-06-13 10:00:00",
            "2024-06-27 23:59:59",
        ),
        pool(
            "Prevail the Lasting Night",
            PoolCategory::Character,
            &["Jiyan"],
            &["Danjin", "Chixia", "Yangyang"],
            "2024-05-23 10:00:00",
            "2024-06-13 09:59:59",
        ),
        pool(
            "Absolute Pulsation: Verdant Summit",
            PoolCategory::Weapon,
            &["Verdant Summit"],
            &["Discord"],
            "2024-05-23 10:00:00",
            "2024-06-13 09:59:59",
        ),
    ])
    .expect("test pools")
}
