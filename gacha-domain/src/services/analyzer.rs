use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::entities::{
    Catalog, FiveStarEntry, FiveStarOverview, HitRecord, Ledger, PityPoint, PityReport,
    PoolCatalog, PoolDefinition, Record, WindowItem, WindowStats,
};
use crate::value_objects::{PlayerId, PoolCategory, Rarity};

/// Pity counters after every record, in ledger order.
///
/// A counter is the number of draws since the last hit of its tier; it drops
/// to zero on the hit itself. Tiers count independently.
pub fn pity_timeline(records: &[Record]) -> Vec<PityPoint> {
    let mut five = 0u32;
    let mut four = 0u32;
    records
        .iter()
        .map(|record| {
            five += 1;
            four += 1;
            match record.rarity {
                Rarity::Five => five = 0,
                Rarity::Four => four = 0,
                Rarity::Three => {}
            }
            PityPoint {
                record_id: record.id.clone(),
                five,
                four,
            }
        })
        .collect()
}

pub fn pity_at(records: &[Record], record_id: &str) -> Option<PityPoint> {
    pity_timeline(records)
        .into_iter()
        .find(|point| point.record_id == record_id)
}

/// One pass over a ledger slice.
#[derive(Debug, Default)]
struct Scan {
    five_hits: Vec<HitRecord>,
    four_hits: Vec<HitRecord>,
    five_pity: u32,
    four_pity: u32,
    guaranteed: bool,
}

/// Read-only analyzer over the process-wide catalog and pool definitions.
#[derive(Debug, Clone, Copy)]
pub struct PityAnalyzer<'a> {
    catalog: &'a Catalog,
    pools: &'a PoolCatalog,
}

impl<'a> PityAnalyzer<'a> {
    pub fn new(catalog: &'a Catalog, pools: &'a PoolCatalog) -> Self {
        Self { catalog, pools }
    }

    fn scan(&self, category: PoolCategory, records: &[Record]) -> Scan {
        let tracks_guarantee = category.has_guarantee();
        let mut scan = Scan::default();
        for record in records {
            scan.five_pity += 1;
            scan.four_pity += 1;
            match record.rarity {
                Rarity::Five => {
                    let is_up = self.pools.is_up(record, self.catalog);
                    let guaranteed = tracks_guarantee && scan.guaranteed && is_up;
                    scan.five_hits.push(hit(record, scan.five_pity, is_up, guaranteed));
                    if tracks_guarantee {
                        scan.guaranteed = !is_up;
                    }
                    scan.five_pity = 0;
                }
                Rarity::Four => {
                    let is_up = self.pools.is_up(record, self.catalog);
                    scan.four_hits.push(hit(record, scan.four_pity, is_up, false));
                    scan.four_pity = 0;
                }
                Rarity::Three => {}
            }
        }
        scan
    }

    pub fn analyze(&self, ledger: &Ledger) -> PityReport {
        let records = ledger.records();
        let scan = self.scan(ledger.category, records);

        let five_average = average(scan.five_hits.iter().map(|h| h.pity), scan.five_hits.len());
        let up_count = scan.five_hits.iter().filter(|h| h.is_up).count();
        let through_last_up = scan
            .five_hits
            .iter()
            .rposition(|h| h.is_up)
            .map(|last| scan.five_hits[..=last].iter().map(|h| h.pity).sum::<u32>())
            .unwrap_or(0);
        let up_average = average(std::iter::once(through_last_up), up_count);
        let four_average = average(scan.four_hits.iter().map(|h| h.pity), scan.four_hits.len());

        PityReport {
            player_id: ledger.player_id.clone(),
            category: ledger.category,
            total: records.len(),
            five_pity: scan.five_pity,
            four_pity: scan.four_pity,
            next_five_guaranteed: ledger
                .category
                .has_guarantee()
                .then_some(scan.guaranteed),
            five_hits: scan.five_hits,
            four_hits: scan.four_hits,
            five_average,
            up_average,
            four_average,
            first_draw: records.first().map(|r| r.time),
            last_draw: records.last().map(|r| r.time),
        }
    }

    /// Folds the draws inside `pool`'s window. Hit pity is ledger-continuous:
    /// draws before the window still count toward the first hit inside it.
    pub fn window_stats(&self, category: PoolCategory, records: &[Record], pool: &PoolDefinition) -> WindowStats {
        let scan = self.scan(category, records);
        fold_window(records, pool, &scan)
    }

    /// Windowed stats for every pool of the ledger's category that saw a draw,
    /// newest pool first.
    pub fn pool_analysis(&self, ledger: &Ledger) -> Vec<WindowStats> {
        let records = ledger.records();
        let scan = self.scan(ledger.category, records);
        let mut windows: Vec<WindowStats> = self
            .pools
            .for_category(ledger.category)
            .map(|pool| fold_window(records, pool, &scan))
            .filter(|stats| stats.count > 0)
            .collect();
        windows.reverse();
        windows
    }

    /// All 5★ hits across the player's ledgers, oldest first.
    pub fn five_star_overview(&self, player_id: &PlayerId, ledgers: &[Ledger]) -> FiveStarOverview {
        let mut hits = Vec::new();
        let mut total_draws = 0;
        for ledger in ledgers {
            total_draws += ledger.len();
            hits.extend(self.scan(ledger.category, ledger.records()).five_hits);
        }
        hits.sort_by_key(|h| h.time);

        let mut by_item: Vec<FiveStarEntry> = Vec::new();
        for hit in &hits {
            match by_item.iter_mut().find(|entry| entry.name == hit.name) {
                Some(entry) => {
                    entry.count += 1;
                    entry.pities.push(hit.pity);
                }
                None => by_item.push(FiveStarEntry {
                    name: hit.name.clone(),
                    item_type: hit.item_type,
                    count: 1,
                    pities: vec![hit.pity],
                }),
            }
        }

        FiveStarOverview {
            player_id: player_id.clone(),
            total_draws,
            five_count: hits.len(),
            average_pity: average(hits.iter().map(|h| h.pity), hits.len()),
            hits,
            by_item,
        }
    }
}

fn hit(record: &Record, pity: u32, is_up: bool, guaranteed: bool) -> HitRecord {
    HitRecord {
        record_id: record.id.clone(),
        name: record.name.clone(),
        item_type: record.item_type,
        rarity: record.rarity,
        category: record.pool_category,
        time: record.time,
        pity,
        is_up,
        guaranteed,
    }
}

fn average(pities: impl Iterator<Item = u32>, count: usize) -> Option<f64> {
    if count == 0 {
        return None;
    }
    let total: u32 = pities.sum();
    Some(((total as f64 / count as f64) * 100.0).round() / 100.0)
}

fn fold_window(records: &[Record], pool: &PoolDefinition, scan: &Scan) -> WindowStats {
    let inside = |time: &NaiveDateTime| pool.contains(time);
    let mut count = 0;
    let mut first_draw = None;
    let mut last_draw = None;
    for record in records.iter().filter(|r| inside(&r.time)) {
        count += 1;
        first_draw.get_or_insert(record.time);
        last_draw = Some(record.time);
    }

    let five_hits: Vec<HitRecord> = scan
        .five_hits
        .iter()
        .filter(|h| inside(&h.time))
        .cloned()
        .collect();
    let four_hits: Vec<HitRecord> = scan
        .four_hits
        .iter()
        .filter(|h| inside(&h.time))
        .cloned()
        .collect();

    let mut items: Vec<WindowItem> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for hit in five_hits.iter().chain(four_hits.iter()) {
        match slots.get(&hit.name) {
            Some(slot) => items[*slot].count += 1,
            None => {
                let featured = match hit.rarity {
                    Rarity::Five => &pool.five,
                    _ => &pool.four,
                };
                slots.insert(hit.name.clone(), items.len());
                items.push(WindowItem {
                    name: hit.name.clone(),
                    item_type: hit.item_type,
                    rarity: hit.rarity,
                    count: 1,
                    is_up: featured.iter().any(|name| name == &hit.name),
                });
            }
        }
    }

    WindowStats {
        pool_name: pool.name.clone(),
        display_name: pool.display_name(),
        version: pool.version.clone(),
        from_time: pool.from_time,
        to_time: pool.to_time,
        first_draw,
        last_draw,
        count,
        items,
        five_hits,
        four_hits,
    }
}
