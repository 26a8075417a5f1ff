// Ledger entity
// Ordered, deduplicated draw history of one (player, pool category) pair

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::entities::Record;
use crate::error::LedgerError;
use crate::value_objects::{PlayerId, PoolCategory, Rarity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    pub player_id: PlayerId,
    pub category: PoolCategory,
    records: Vec<Record>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub superseded: usize,
    pub duplicates: usize,
}

impl MergeOutcome {
    pub fn absorb(&mut self, other: MergeOutcome) {
        self.added += other.added;
        self.superseded += other.superseded;
        self.duplicates += other.duplicates;
    }
}

type Fingerprint = (String, Rarity, NaiveDateTime);

impl Ledger {
    pub fn new(player_id: PlayerId, category: PoolCategory) -> Self {
        Self {
            player_id,
            category,
            records: Vec::new(),
        }
    }

    /// Rebuilds a ledger from persisted rows, keeping their stored order for ties.
    pub fn from_records(
        player_id: PlayerId,
        category: PoolCategory,
        mut records: Vec<Record>,
    ) -> Result<Self, LedgerError> {
        let mut ids = HashSet::with_capacity(records.len());
        for record in &records {
            if record.pool_category != category {
                return Err(LedgerError::schema(
                    None,
                    format!("record {} is not a {} draw", record.id, category),
                ));
            }
            if !ids.insert(record.id.as_str()) {
                return Err(LedgerError::schema(
                    None,
                    format!("duplicate record id {} in stored ledger", record.id),
                ));
            }
        }
        records.sort_by_key(|record| record.time);
        Ok(Self {
            player_id,
            category,
            records,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Appends the unseen part of `incoming` and restores time order.
    ///
    /// Records whose id is already present are dropped (first write wins).
    /// An authoritative id arriving for a draw held under a synthesized id
    /// replaces that id in place; a synthesized record for a draw held under an
    /// authoritative id is treated as a duplicate. The sort is stable, so ties
    /// keep the order in which records entered the ledger.
    pub fn merge(&mut self, incoming: Vec<Record>) -> Result<MergeOutcome, LedgerError> {
        if let Some(stray) = incoming.iter().find(|r| r.pool_category != self.category) {
            return Err(LedgerError::schema(
                None,
                format!(
                    "record {} belongs to {}, not {}",
                    stray.id, stray.pool_category, self.category
                ),
            ));
        }

        let mut outcome = MergeOutcome::default();
        let mut matcher = Matcher::new(&self.records);
        let mut appended = Vec::new();

        for record in incoming {
            match matcher.classify(&record) {
                Match::Known => outcome.duplicates += 1,
                Match::Counterpart(_) if record.has_synthetic_id() => outcome.duplicates += 1,
                Match::Counterpart(pos) => {
                    let held = &mut self.records[pos];
                    matcher.ids.remove(&held.id);
                    matcher.ids.insert(record.id.clone());
                    held.id = record.id;
                    outcome.superseded += 1;
                }
                Match::Unseen => appended.push(record),
            }
        }

        outcome.added = appended.len();
        if !appended.is_empty() {
            self.records.extend(appended);
            self.records.sort_by_key(|record| record.time);
        }
        Ok(outcome)
    }

    /// The part of `incoming` that [`Ledger::merge`] would append. A draw
    /// held under the other kind of id (synthesized vs. authoritative) counts
    /// as present, so merging only this part never rewrites a held id.
    pub fn unseen(&self, incoming: &[Record]) -> Vec<Record> {
        let mut matcher = Matcher::new(&self.records);
        incoming
            .iter()
            .filter(|record| matches!(matcher.classify(record), Match::Unseen))
            .cloned()
            .collect()
    }
}

enum Match {
    /// Id already held.
    Known,
    /// Same draw held under the other kind of id, at this position.
    Counterpart(usize),
    Unseen,
}

/// Dedup state shared by `merge` and `unseen`. Each held record can be
/// claimed by at most one incoming counterpart.
struct Matcher {
    ids: HashSet<String>,
    by_fingerprint: HashMap<Fingerprint, Vec<(usize, bool)>>,
    claimed: HashSet<usize>,
}

impl Matcher {
    fn new(held: &[Record]) -> Self {
        let mut by_fingerprint: HashMap<Fingerprint, Vec<(usize, bool)>> = HashMap::new();
        for (idx, record) in held.iter().enumerate() {
            by_fingerprint
                .entry(fingerprint_key(record))
                .or_default()
                .push((idx, record.has_synthetic_id()));
        }
        Self {
            ids: held.iter().map(|r| r.id.clone()).collect(),
            by_fingerprint,
            claimed: HashSet::new(),
        }
    }

    fn classify(&mut self, record: &Record) -> Match {
        if self.ids.contains(&record.id) {
            return Match::Known;
        }
        let synthetic = record.has_synthetic_id();
        let claimed = &self.claimed;
        let counterpart = self
            .by_fingerprint
            .get(&fingerprint_key(record))
            .and_then(|positions| {
                positions
                    .iter()
                    .find(|(pos, held_synthetic)| !claimed.contains(pos) && *held_synthetic != synthetic)
                    .map(|(pos, _)| *pos)
            });
        match counterpart {
            Some(pos) => {
                self.claimed.insert(pos);
                Match::Counterpart(pos)
            }
            None => {
                self.ids.insert(record.id.clone());
                Match::Unseen
            }
        }
    }
}

fn fingerprint_key(record: &Record) -> Fingerprint {
    let (name, rarity, time) = record.fingerprint();
    (name.to_string(), rarity, time)
}

/// Finds a legacy record whose draw already sits, under a synthesized id, in
/// another category of the same player.
pub fn find_category_conflict<'a>(
    existing: &'a [Ledger],
    incoming: &'a [Record],
) -> Option<(&'a Record, PoolCategory)> {
    let mut held: HashMap<(&str, NaiveDateTime), Vec<PoolCategory>> = HashMap::new();
    for ledger in existing {
        for record in ledger.records.iter().filter(|r| r.has_synthetic_id()) {
            held.entry((record.name.as_str(), record.time))
                .or_default()
                .push(ledger.category);
        }
    }
    incoming
        .iter()
        .filter(|record| record.has_synthetic_id())
        .find_map(|record| {
            held.get(&(record.name.as_str(), record.time))?
                .iter()
                .find(|category| **category != record.pool_category)
                .map(|category| (record, *category))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::synthetic_id;
    use crate::utils::parse_time;
    use crate::value_objects::ItemType;

    fn player() -> PlayerId {
        PlayerId("42".to_string())
    }

    fn record(id: &str, name: &str, rarity: Rarity, time: &str) -> Record {
        Record {
            id: id.to_string(),
            name: name.to_string(),
            item_id: 0,
            pool_category: PoolCategory::Character,
            item_type: ItemType::Character,
            rarity,
            time: parse_time(time).expect("time"),
        }
    }

    fn synthetic(name: &str, rarity: Rarity, time: &str, ordinal: usize) -> Record {
        let time_value = parse_time(time).expect("time");
        let mut rec = record("", name, rarity, time);
        rec.id = synthetic_id(PoolCategory::Character, name, &time_value, ordinal);
        rec
    }

    fn ids(ledger: &Ledger) -> Vec<&str> {
        ledger.records().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn merge_is_idempotent() {
        let batch = vec![
            record("a", "Calcharo", Rarity::Five, "2024-05-23 10:00:00"),
            record("b", "Danjin", Rarity::Four, "2024-05-23 10:00:01"),
            record("c", "Yangyang", Rarity::Four, "2024-05-23 10:00:02"),
        ];
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        let first = ledger.merge(batch.clone()).expect("merge");
        assert_eq!(first.added, 3);
        let snapshot = ledger.clone();
        let second = ledger.merge(batch).expect("merge again");
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(ledger, snapshot);
    }

    #[test]
    fn first_write_wins_on_id_collision() {
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        ledger
            .merge(vec![record("a", "Calcharo", Rarity::Five, "2024-05-23 10:00:00")])
            .expect("merge");
        let outcome = ledger
            .merge(vec![record("a", "Jiyan", Rarity::Five, "2024-05-24 10:00:00")])
            .expect("merge");
        assert_eq!(outcome.added, 0);
        assert_eq!(ledger.records()[0].name, "Calcharo");
    }

    #[test]
    fn ties_keep_insertion_order_across_batches() {
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        ledger
            .merge(vec![
                record("x2", "Danjin", Rarity::Four, "2024-05-23 10:00:00"),
                record("x1", "Yangyang", Rarity::Four, "2024-05-23 10:00:00"),
                record("late", "Chixia", Rarity::Four, "2024-05-23 10:05:00"),
            ])
            .expect("merge");
        ledger
            .merge(vec![
                record("x0", "Sanhua", Rarity::Four, "2024-05-23 10:00:00"),
                record("early", "Calcharo", Rarity::Five, "2024-05-23 09:00:00"),
            ])
            .expect("merge");
        assert_eq!(ids(&ledger), vec!["early", "x2", "x1", "x0", "late"]);
    }

    #[test]
    fn authoritative_id_supersedes_synthesized_in_place() {
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        ledger
            .merge(vec![
                synthetic("Danjin", Rarity::Four, "2024-05-23 10:00:00", 0),
                synthetic("Danjin", Rarity::Four, "2024-05-23 10:00:00", 1),
                synthetic("Yangyang", Rarity::Four, "2024-05-23 10:00:00", 0),
            ])
            .expect("legacy merge");
        let outcome = ledger
            .merge(vec![
                record("1001", "Danjin", Rarity::Four, "2024-05-23 10:00:00"),
                record("1002", "Danjin", Rarity::Four, "2024-05-23 10:00:00"),
                record("1003", "Yangyang", Rarity::Four, "2024-05-23 10:00:00"),
                record("1004", "Calcharo", Rarity::Five, "2024-05-23 10:00:01"),
            ])
            .expect("live merge");
        assert_eq!(outcome.superseded, 3);
        assert_eq!(outcome.added, 1);
        assert_eq!(ids(&ledger), vec!["1001", "1002", "1003", "1004"]);
    }

    #[test]
    fn synthesized_copy_of_authoritative_draw_is_duplicate() {
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        ledger
            .merge(vec![record("1001", "Danjin", Rarity::Four, "2024-05-23 10:00:00")])
            .expect("merge");
        let outcome = ledger
            .merge(vec![
                synthetic("Danjin", Rarity::Four, "2024-05-23 10:00:00", 0),
                synthetic("Danjin", Rarity::Four, "2024-05-23 10:00:00", 1),
            ])
            .expect("merge");
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.added, 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn unseen_skips_draws_held_under_either_kind_of_id() {
        let mut ledger = Ledger::new(player(), PoolCategory::Character);
        ledger
            .merge(vec![
                record("901", "Danjin", Rarity::Four, "2024-05-23 10:00:00"),
                synthetic("Chixia", Rarity::Four, "2024-05-23 10:00:01", 0),
            ])
            .expect("merge");
        let incoming = vec![
            synthetic("Danjin", Rarity::Four, "2024-05-23 10:00:00", 0),
            record("902", "Chixia", Rarity::Four, "2024-05-23 10:00:01"),
            record("903", "Yangyang", Rarity::Four, "2024-05-23 10:00:02"),
            record("901", "Danjin", Rarity::Four, "2024-05-23 10:00:00"),
        ];
        let unseen = ledger.unseen(&incoming);
        let unseen_ids: Vec<&str> = unseen.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(unseen_ids, vec!["903"]);

        let before: Vec<String> = ledger.records().iter().map(|r| r.id.clone()).collect();
        let outcome = ledger.merge(unseen).expect("merge unseen");
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.superseded, 0);
        for id in &before {
            assert!(ledger.get(id).is_some(), "held id {id} was rewritten");
        }
    }

    #[test]
    fn merge_rejects_foreign_category() {
        let mut ledger = Ledger::new(player(), PoolCategory::Weapon);
        let err = ledger
            .merge(vec![record("a", "Calcharo", Rarity::Five, "2024-05-23 10:00:00")])
            .expect_err("category mismatch");
        assert!(matches!(err, LedgerError::Schema { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn category_conflict_is_detected_for_synthesized_draws() {
        let mut standard = Ledger::new(player(), PoolCategory::Standard);
        let mut held = synthetic("Calcharo", Rarity::Five, "2024-05-23 10:00:00", 0);
        held.pool_category = PoolCategory::Standard;
        standard.merge(vec![held]).expect("merge");

        let incoming = vec![synthetic("Calcharo", Rarity::Five, "2024-05-23 10:00:00", 0)];
        let conflict = find_category_conflict(std::slice::from_ref(&standard), &incoming);
        assert_eq!(conflict.map(|(_, c)| c), Some(PoolCategory::Standard));

        let authoritative = vec![record("a", "Calcharo", Rarity::Five, "2024-05-23 10:00:00")];
        assert!(find_category_conflict(std::slice::from_ref(&standard), &authoritative).is_none());
    }

    #[test]
    fn category_conflict_looks_past_the_own_category() {
        let mut own = Ledger::new(player(), PoolCategory::Character);
        own.merge(vec![synthetic("Calcharo", Rarity::Five, "2024-05-23 10:00:00", 0)])
            .expect("merge own");
        let mut standard = Ledger::new(player(), PoolCategory::Standard);
        let mut held = synthetic("Calcharo", Rarity::Five, "2024-05-23 10:00:00", 0);
        held.pool_category = PoolCategory::Standard;
        standard.merge(vec![held]).expect("merge standard");

        let mut incoming: Vec<Record> = (1..=50)
            .map(|n| synthetic("Danjin", Rarity::Four, &format!("2024-05-23 11:00:{:02}", n % 60), n))
            .collect();
        incoming.push(synthetic("Calcharo", Rarity::Five, "2024-05-23 10:00:00", 0));
        let records = [own, standard];
        let conflict = find_category_conflict(&records, &incoming);
        let (record, category) = conflict.expect("conflict");
        assert_eq!(record.name, "Calcharo");
        assert_eq!(category, PoolCategory::Standard);
    }
}
