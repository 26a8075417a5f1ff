// Live API adapter
// Upstream summon-record response shape; decode only

use serde::{Deserialize, Serialize};

use crate::entities::{Catalog, RawRecord, Record, SyntheticIdAllocator};
use crate::error::LedgerError;
use crate::formats::{settle, DecodedBatch, PendingRecord, SourceFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveHistory {
    pub player_id: String,
    #[serde(default)]
    pub pages: Vec<LivePage>,
}

/// Records of one card pool, newest first as the upstream pages them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePage {
    pub card_pool_type: u32,
    #[serde(default)]
    pub records: Vec<LiveGachaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGachaEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub resource_id: u32,
    pub resource_type: String,
    pub quality_level: u8,
    pub count: u32,
    pub time: String,
}

pub fn parse(bytes: &[u8]) -> Result<LiveHistory, LedgerError> {
    serde_json::from_slice(bytes)
        .map_err(|err| LedgerError::Format(format!("invalid live API response: {}", err)))
}

/// Strict decode: one invalid entry fails the whole response.
pub fn decode(history: &LiveHistory, catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    let mut allocator = SyntheticIdAllocator::default();
    let mut records = Vec::new();
    let mut row = 0;
    for page in &history.pages {
        let mut pending = Vec::with_capacity(page.records.len());
        for entry in page.records.iter().rev() {
            row += 1;
            let id = entry
                .id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            let synthesize_id = id.is_none();
            let raw = RawRecord {
                id,
                name: entry.name.clone(),
                pool_category: page.card_pool_type.to_string(),
                item_id: Some(entry.resource_id.to_string()),
                item_type: Some(entry.resource_type.clone()),
                rarity: entry.quality_level.to_string(),
                time: entry.time.clone(),
                count: Some(entry.count.to_string()),
            };
            let record = Record::validate(raw, catalog)
                .map_err(|err| LedgerError::invalid_row(row, err))?;
            pending.push(PendingRecord {
                record,
                synthesize_id,
            });
        }
        records.extend(settle(pending, &mut allocator));
    }

    Ok(DecodedBatch {
        format: SourceFormat::LiveApi,
        player_id: Some(history.player_id.clone()),
        records,
        skipped: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_catalog;
    use crate::value_objects::PoolCategory;

    fn entry(id: Option<&str>, name: &str, resource_id: u32, quality: u8, time: &str) -> LiveGachaEntry {
        LiveGachaEntry {
            id: id.map(str::to_string),
            name: name.to_string(),
            resource_id,
            resource_type: "角色".to_string(),
            quality_level: quality,
            count: 1,
            time: time.to_string(),
        }
    }

    #[test]
    fn decode_turns_pages_chronological() {
        let history = LiveHistory {
            player_id: "100000001".to_string(),
            pages: vec![LivePage {
                card_pool_type: 1,
                records: vec![
                    entry(Some("3"), "Yangyang", 1402, 4, "2024-05-23 10:00:02"),
                    entry(Some("2"), "Danjin", 1602, 4, "2024-05-23 10:00:01"),
                    entry(Some("1"), "Jiyan", 1404, 5, "2024-05-23 10:00:00"),
                ],
            }],
        };
        let batch = decode(&history, &test_catalog()).expect("decode");
        let ids: Vec<&str> = batch.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(batch.format, SourceFormat::LiveApi);
        assert!(batch.records.iter().all(|r| r.pool_category == PoolCategory::Character));
    }

    #[test]
    fn decode_keeps_tie_order_of_reversed_page() {
        let history = LiveHistory {
            player_id: "1".to_string(),
            pages: vec![LivePage {
                card_pool_type: 1,
                records: vec![
                    entry(Some("b"), "Danjin", 1602, 4, "2024-05-23 10:00:00"),
                    entry(Some("a"), "Chixia", 1202, 4, "2024-05-23 10:00:00"),
                ],
            }],
        };
        let batch = decode(&history, &test_catalog()).expect("decode");
        let ids: Vec<&str> = batch.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn decode_fails_closed_on_bad_entry() {
        let history = LiveHistory {
            player_id: "1".to_string(),
            pages: vec![LivePage {
                card_pool_type: 1,
                records: vec![entry(None, "Jiyan", 1404, 4, "2024-05-23 10:00:00")],
            }],
        };
        let err = decode(&history, &test_catalog()).expect_err("rarity mismatch");
        assert!(matches!(err, LedgerError::Schema { row: Some(1), .. }));
    }

    #[test]
    fn parse_reads_camel_case_shape() {
        let raw = r#"{"playerId":"1","pages":[{"cardPoolType":2,"records":[{"name":"Verdant Summit","resourceId":21010016,"resourceType":"武器","qualityLevel":5,"count":1,"time":"2024-05-23 10:00:00"}]}]}"#;
        let history = parse(raw.as_bytes()).expect("parse");
        let batch = decode(&history, &test_catalog()).expect("decode");
        assert_eq!(batch.records[0].pool_category, PoolCategory::Weapon);
        assert!(batch.records[0].has_synthetic_id());
    }
}
