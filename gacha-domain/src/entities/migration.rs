// Migration entities
// Copying one player's history under a new player identity

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entities::{Ledger, Record};
use crate::value_objects::{PlayerId, PoolCategory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMigration {
    pub category: PoolCategory,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub old_player_id: PlayerId,
    pub new_player_id: PlayerId,
    pub categories: Vec<CategoryMigration>,
}

impl MigrationPlan {
    /// Per category, the records under `old` that `new` does not hold yet.
    /// A draw `new` already holds under the other kind of id (synthesized vs.
    /// authoritative) counts as held, the same way [`Ledger::merge`] matches
    /// them. Returns `None` when there is nothing to copy.
    pub fn build(
        old_player_id: PlayerId,
        new_player_id: PlayerId,
        old_ledgers: &[Ledger],
        new_ledgers: &[Ledger],
    ) -> Option<Self> {
        let mut categories = Vec::new();
        for old in old_ledgers {
            let records = match new_ledgers.iter().find(|ledger| ledger.category == old.category) {
                Some(target) => target.unseen(old.records()),
                None => old.records().to_vec(),
            };
            if !records.is_empty() {
                categories.push(CategoryMigration {
                    category: old.category,
                    records,
                });
            }
        }
        if categories.is_empty() {
            return None;
        }
        Some(Self {
            old_player_id,
            new_player_id,
            categories,
        })
    }

    pub fn record_count(&self) -> usize {
        self.categories.iter().map(|c| c.records.len()).sum()
    }
}

/// A planned record whose id is already taken in `target` by different draw content.
pub fn find_conflicting_record<'a>(target: &Ledger, planned: &'a [Record]) -> Option<&'a Record> {
    planned.iter().find(|record| {
        target
            .get(&record.id)
            .map(|held| held != *record)
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFailure {
    pub category: PoolCategory,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationResult {
    NothingToMigrate,
    Completed {
        migrated: BTreeMap<PoolCategory, usize>,
    },
    PartialFailure {
        migrated: BTreeMap<PoolCategory, usize>,
        failed: Vec<CategoryFailure>,
    },
}

impl MigrationResult {
    pub fn failed_categories(&self) -> Vec<PoolCategory> {
        match self {
            MigrationResult::PartialFailure { failed, .. } => {
                failed.iter().map(|failure| failure.category).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::synthetic_id;
    use crate::utils::parse_time;
    use crate::value_objects::{ItemType, Rarity};

    fn record(id: &str, name: &str, category: PoolCategory) -> Record {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            item_id: 0,
            pool_category: category,
            item_type: ItemType::Character,
            rarity: Rarity::Four,
            time: parse_time("2024-05-23 10:00:00").expect("time"),
        }
    }

    fn ledger(player: &str, category: PoolCategory, records: Vec<Record>) -> Ledger {
        Ledger::from_records(PlayerId(player.to_string()), category, records).expect("ledger")
    }

    #[test]
    fn plan_lists_only_missing_ids() {
        let old = vec![
            ledger(
                "1",
                PoolCategory::Character,
                vec![
                    record("a", "Danjin", PoolCategory::Character),
                    record("b", "Chixia", PoolCategory::Character),
                ],
            ),
            ledger("1", PoolCategory::Standard, vec![record("s", "Sanhua", PoolCategory::Standard)]),
        ];
        let new = vec![
            ledger("2", PoolCategory::Character, vec![record("a", "Danjin", PoolCategory::Character)]),
            ledger("2", PoolCategory::Standard, vec![record("s", "Sanhua", PoolCategory::Standard)]),
        ];
        let plan = MigrationPlan::build(
            PlayerId("1".to_string()),
            PlayerId("2".to_string()),
            &old,
            &new,
        )
        .expect("plan");
        assert_eq!(plan.categories.len(), 1);
        assert_eq!(plan.categories[0].category, PoolCategory::Character);
        assert_eq!(plan.categories[0].records[0].id, "b");
        assert_eq!(plan.record_count(), 1);
    }

    #[test]
    fn plan_is_none_when_target_is_superset() {
        let old = vec![ledger("1", PoolCategory::Character, vec![record("a", "Danjin", PoolCategory::Character)])];
        let plan = MigrationPlan::build(
            PlayerId("1".to_string()),
            PlayerId("2".to_string()),
            &old,
            &old,
        );
        assert!(plan.is_none());
    }

    #[test]
    fn plan_treats_either_kind_of_id_as_held() {
        let time = parse_time("2024-05-23 10:00:00").expect("time");
        let mut legacy = record("", "Danjin", PoolCategory::Character);
        legacy.id = synthetic_id(PoolCategory::Character, "Danjin", &time, 0);
        let live = record("901", "Danjin", PoolCategory::Character);

        let from_legacy = vec![ledger("1", PoolCategory::Character, vec![legacy])];
        let from_live = vec![ledger("2", PoolCategory::Character, vec![live])];
        let one = PlayerId("1".to_string());
        let two = PlayerId("2".to_string());
        assert!(MigrationPlan::build(one.clone(), two.clone(), &from_legacy, &from_live).is_none());
        assert!(MigrationPlan::build(two, one, &from_live, &from_legacy).is_none());
    }

    #[test]
    fn conflicting_record_differs_in_content() {
        let target = ledger("2", PoolCategory::Character, vec![record("a", "Danjin", PoolCategory::Character)]);
        let same = vec![record("a", "Danjin", PoolCategory::Character)];
        assert!(find_conflicting_record(&target, &same).is_none());
        let clash = vec![record("a", "Chixia", PoolCategory::Character)];
        assert_eq!(
            find_conflicting_record(&target, &clash).map(|r| r.name.as_str()),
            Some("Chixia")
        );
    }
}
