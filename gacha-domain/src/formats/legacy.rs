// Legacy tabular adapter
// Spreadsheet-style exports: {uid?, app?, columns, rows}; no stable ids, best effort

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Catalog, RawRecord, Record, SyntheticIdAllocator};
use crate::error::LedgerError;
use crate::formats::{scalar_text, settle, DecodedBatch, PendingRecord, SourceFormat};
use crate::utils::format_time;
use crate::value_objects::{PlayerId, PoolCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Time,
    Name,
    ItemType,
    Rarity,
    Banner,
}

const COLUMN_ALIASES: &[(&str, Column)] = &[
    ("time", Column::Time),
    ("时间", Column::Time),
    ("name", Column::Name),
    ("名称", Column::Name),
    ("item_type", Column::ItemType),
    ("类别", Column::ItemType),
    ("类型", Column::ItemType),
    ("rarity", Column::Rarity),
    ("星级", Column::Rarity),
    ("banner", Column::Banner),
    ("唤取类型", Column::Banner),
    ("祈愿类型", Column::Banner),
    ("卡池", Column::Banner),
];

const REQUIRED: [Column; 4] = [Column::Time, Column::Name, Column::Rarity, Column::Banner];

/// Banner names as third-party tools print them. The first entry per
/// category is the label written on encode.
const BANNER_LABELS: &[(&str, PoolCategory)] = &[
    ("角色活动唤取", PoolCategory::Character),
    ("角色精准调谐", PoolCategory::Character),
    ("角色祈愿", PoolCategory::Character),
    ("featured resonator convene", PoolCategory::Character),
    ("character event", PoolCategory::Character),
    ("武器活动唤取", PoolCategory::Weapon),
    ("武器精准调谐", PoolCategory::Weapon),
    ("武器祈愿", PoolCategory::Weapon),
    ("featured weapon convene", PoolCategory::Weapon),
    ("weapon event", PoolCategory::Weapon),
    ("角色常驻唤取", PoolCategory::Standard),
    ("常驻唤取", PoolCategory::Standard),
    ("常驻祈愿", PoolCategory::Standard),
    ("standard resonator convene", PoolCategory::Standard),
    ("standard", PoolCategory::Standard),
    ("武器常驻唤取", PoolCategory::StandardWeapon),
    ("常驻武器祈愿", PoolCategory::StandardWeapon),
    ("standard weapon convene", PoolCategory::StandardWeapon),
    ("standard weapon", PoolCategory::StandardWeapon),
    ("新手唤取", PoolCategory::Beginner),
    ("新手自选唤取", PoolCategory::Beginner),
    ("感恩定向唤取", PoolCategory::Beginner),
    ("新手祈愿", PoolCategory::Beginner),
    ("beginner convene", PoolCategory::Beginner),
    ("beginner's choice convene", PoolCategory::Beginner),
    ("giveback custom convene", PoolCategory::Beginner),
];

pub fn banner_category(label: &str) -> Option<PoolCategory> {
    let normalized = label.trim().to_lowercase();
    BANNER_LABELS
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, category)| *category)
}

pub fn banner_label(category: PoolCategory) -> &'static str {
    BANNER_LABELS
        .iter()
        .find(|(_, known)| *known == category)
        .map(|(label, _)| *label)
        .unwrap_or_else(|| category.label())
}

fn column_positions(columns: &[String]) -> Result<HashMap<Column, usize>, LedgerError> {
    let mut positions = HashMap::new();
    for (idx, header) in columns.iter().enumerate() {
        let header = header.trim().to_lowercase();
        if let Some((_, column)) = COLUMN_ALIASES.iter().find(|(alias, _)| *alias == header) {
            positions.entry(*column).or_insert(idx);
        }
    }
    for column in REQUIRED {
        if !positions.contains_key(&column) {
            return Err(LedgerError::Format(format!(
                "legacy table is missing the {:?} column",
                column
            )));
        }
    }
    Ok(positions)
}

/// Best-effort decode: rows with an unknown banner or a failing field are
/// dropped and counted in `skipped`; ids are synthesized for every row.
pub fn decode(bytes: &[u8], catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    let table: LegacyTable = serde_json::from_slice(bytes)
        .map_err(|err| LedgerError::Format(format!("invalid legacy table: {}", err)))?;
    decode_table(table, catalog)
}

pub fn decode_table(table: LegacyTable, catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    let positions = column_positions(&table.columns)?;
    let cell = |row: &[Value], column: Column| -> Option<String> {
        positions
            .get(&column)
            .and_then(|idx| row.get(*idx))
            .and_then(scalar_text)
    };

    let mut pending = Vec::with_capacity(table.rows.len());
    let mut skipped = 0;
    for row in &table.rows {
        let (Some(time), Some(name), Some(rarity), Some(banner)) = (
            cell(row, Column::Time),
            cell(row, Column::Name),
            cell(row, Column::Rarity),
            cell(row, Column::Banner),
        ) else {
            skipped += 1;
            continue;
        };
        let Some(category) = banner_category(&banner) else {
            skipped += 1;
            continue;
        };
        let raw = RawRecord {
            id: None,
            name,
            pool_category: category.code().to_string(),
            item_id: None,
            item_type: cell(row, Column::ItemType).filter(|value| !value.is_empty()),
            rarity,
            time,
            count: None,
        };
        match Record::validate(raw, catalog) {
            Ok(record) => pending.push(PendingRecord {
                record,
                synthesize_id: true,
            }),
            Err(_) => skipped += 1,
        }
    }

    let mut allocator = SyntheticIdAllocator::default();
    Ok(DecodedBatch {
        format: SourceFormat::Legacy,
        player_id: table.uid.filter(|uid| !uid.trim().is_empty()),
        records: settle(pending, &mut allocator),
        skipped,
    })
}

/// Canonical column set, Chinese headers and banner labels, chronological rows.
pub fn build_table(records: &[Record], player_id: Option<&PlayerId>, app: &str) -> LegacyTable {
    let columns = ["时间", "名称", "类别", "星级", "唤取类型"]
        .iter()
        .map(|header| header.to_string())
        .collect();
    let rows = records
        .iter()
        .map(|record| {
            vec![
                Value::String(format_time(&record.time)),
                Value::String(record.name.clone()),
                Value::String(record.item_type.label().to_string()),
                Value::from(record.rarity.stars()),
                Value::String(banner_label(record.pool_category).to_string()),
            ]
        })
        .collect();
    LegacyTable {
        uid: player_id.map(|id| id.to_string()),
        app: Some(app.to_string()),
        columns,
        rows,
    }
}

pub fn encode(records: &[Record], player_id: Option<&PlayerId>, app: &str) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec_pretty(&build_table(records, player_id, app))
        .map_err(|err| LedgerError::Format(format!("failed to encode legacy table: {}", err)))
}
