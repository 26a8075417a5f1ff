// Interchange (UIMF) adapter
// Versioned full-fidelity export envelope: {info, list}

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::entities::{Catalog, RawRecord, Record, SyntheticIdAllocator};
use crate::error::LedgerError;
use crate::formats::{scalar_text, settle, DecodedBatch, PendingRecord, SourceFormat};
use crate::utils::{format_time, TIME_FORMAT};
use crate::value_objects::{PlayerId, PoolCategory};

/// Version written by [`encode`].
pub const UIMF_VERSION: &str = "v1.1";
/// Versions [`decode`] accepts. `v1.0` predates `region_time_zone`.
pub const ACCEPTED_VERSIONS: [&str; 2] = ["v1.1", "v1.0"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UimfInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub uid: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub export_time: String,
    #[serde(default)]
    pub export_timestamp: i64,
    #[serde(default)]
    pub export_app: String,
    #[serde(default)]
    pub export_app_version: String,
    pub uimf_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_time_zone: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UimfItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_count", deserialize_with = "lenient_string")]
    pub count: String,
    #[serde(deserialize_with = "lenient_string")]
    pub gacha_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_id: String,
    pub item_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub rank_type: String,
    pub time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub uimf_gacha_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UimfExport {
    pub info: UimfInfo,
    pub list: Vec<UimfItem>,
}

/// Envelope fields the caller supplies on export.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    pub player_id: PlayerId,
    pub lang: String,
    pub export_app: String,
    pub export_app_version: String,
    pub exported_at: DateTime<Utc>,
}

fn default_count() -> String {
    "1".to_string()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| de::Error::custom(format!("expected a string, found {}", value)))
}

/// Server offset in hours, derived from the uid prefix.
pub fn region_time_zone(uid: &str) -> i32 {
    match uid.trim().chars().next() {
        Some('6') => -5,
        Some('7') => 1,
        _ => 8,
    }
}

/// `uimf_{uid}_{yyyymmddHHMMSS}.json`
pub fn export_file_name(player_id: &PlayerId, exported_at: &NaiveDateTime) -> String {
    format!("uimf_{}_{}.json", player_id, exported_at.format("%Y%m%d%H%M%S"))
}

/// Strict decode: any invalid row aborts the whole payload.
pub fn decode(bytes: &[u8], catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    let export: UimfExport = serde_json::from_slice(bytes)
        .map_err(|err| LedgerError::Format(format!("invalid interchange payload: {}", err)))?;
    decode_export(export, catalog)
}

pub fn decode_export(export: UimfExport, catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    let version = export.info.uimf_version.trim();
    if !ACCEPTED_VERSIONS.contains(&version) {
        return Err(LedgerError::Format(format!(
            "unsupported uimf_version '{}'",
            export.info.uimf_version
        )));
    }
    if version == UIMF_VERSION && export.info.region_time_zone.is_none() {
        return Err(LedgerError::Format(format!(
            "uimf_version {} requires region_time_zone",
            UIMF_VERSION
        )));
    }

    let mut pending = Vec::with_capacity(export.list.len());
    for (idx, item) in export.list.into_iter().enumerate() {
        let row = idx + 1;
        let declared = PoolCategory::from_code(&item.gacha_type);
        let authoritative = PoolCategory::from_code(&item.uimf_gacha_type);
        if declared.is_none() || declared != authoritative {
            return Err(LedgerError::schema(
                Some(row),
                format!(
                    "gacha_type '{}' disagrees with uimf_gacha_type '{}'",
                    item.gacha_type, item.uimf_gacha_type
                ),
            ));
        }

        let id = Some(item.id.trim().to_string()).filter(|id| !id.is_empty());
        let synthesize_id = id.is_none();
        let raw = RawRecord {
            id,
            name: item.name,
            pool_category: item.uimf_gacha_type,
            item_id: Some(item.item_id),
            item_type: Some(item.item_type),
            rarity: item.rank_type,
            time: item.time,
            count: Some(item.count),
        };
        let record = Record::validate(raw, catalog)
            .map_err(|err| LedgerError::invalid_row(row, err))?;
        pending.push(PendingRecord {
            record,
            synthesize_id,
        });
    }

    let mut allocator = SyntheticIdAllocator::default();
    Ok(DecodedBatch {
        format: SourceFormat::Interchange,
        player_id: Some(export.info.uid),
        records: settle(pending, &mut allocator),
        skipped: 0,
    })
}

/// Builds the current-version envelope for `records`, which the caller
/// passes in ledger order.
pub fn build_export(records: &[Record], meta: &ExportMetadata) -> UimfExport {
    let zone = region_time_zone(meta.player_id.as_str());
    let export_time = FixedOffset::east_opt(zone * 3600)
        .map(|offset| meta.exported_at.with_timezone(&offset).naive_local())
        .unwrap_or_else(|| meta.exported_at.naive_utc());

    let list = records
        .iter()
        .map(|record| UimfItem {
            id: record.id.clone(),
            name: record.name.clone(),
            count: "1".to_string(),
            gacha_type: record.pool_category.code().to_string(),
            item_id: record.item_id.to_string(),
            item_type: record.item_type.label().to_string(),
            rank_type: record.rarity.stars().to_string(),
            time: format_time(&record.time),
            uimf_gacha_type: record.pool_category.code().to_string(),
        })
        .collect();

    UimfExport {
        info: UimfInfo {
            uid: meta.player_id.to_string(),
            lang: meta.lang.clone(),
            export_time: export_time.format(TIME_FORMAT).to_string(),
            export_timestamp: meta.exported_at.timestamp(),
            export_app: meta.export_app.clone(),
            export_app_version: meta.export_app_version.clone(),
            uimf_version: UIMF_VERSION.to_string(),
            region_time_zone: Some(zone),
        },
        list,
    }
}

pub fn encode(records: &[Record], meta: &ExportMetadata) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec_pretty(&build_export(records, meta))
        .map_err(|err| LedgerError::Format(format!("failed to encode interchange payload: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_catalog;
    use crate::utils::parse_time;
    use chrono::TimeZone;

    fn meta(uid: &str) -> ExportMetadata {
        ExportMetadata {
            player_id: PlayerId(uid.to_string()),
            lang: "zh-cn".to_string(),
            export_app: "gacha-ledger".to_string(),
            export_app_version: "0.1.0".to_string(),
            exported_at: Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).single().expect("time"),
        }
    }

    fn payload(version: &str, zone: &str, items: &str) -> String {
        format!(
            r#"{{"info":{{"uid":"100000001","lang":"zh-cn","uimf_version":"{}"{}}},"list":[{}]}}"#,
            version, zone, items
        )
    }

    const CALCHARO: &str = r#"{"id":"1716400000001","name":"卡卡罗","count":"1","gacha_type":"3","item_id":"1301","item_type":"角色","rank_type":"5","time":"2024-05-23 10:00:00","uimf_gacha_type":"3"}"#;

    #[test]
    fn decode_accepts_current_and_previous_version() {
        let catalog = test_catalog();
        let current = payload("v1.1", r#","region_time_zone":8"#, CALCHARO);
        let batch = decode(current.as_bytes(), &catalog).expect("v1.1");
        assert_eq!(batch.format, SourceFormat::Interchange);
        assert_eq!(batch.player_id.as_deref(), Some("100000001"));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].name, "Calcharo");
        assert_eq!(batch.records[0].pool_category, PoolCategory::Standard);

        let previous = payload("v1.0", "", CALCHARO);
        assert_eq!(decode(previous.as_bytes(), &catalog).expect("v1.0").records, batch.records);
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let catalog = test_catalog();
        let err = decode(payload("v3.0", "", CALCHARO).as_bytes(), &catalog).expect_err("version");
        assert!(matches!(err, LedgerError::Format(_)));
    }

    #[test]
    fn decode_aborts_on_single_bad_row() {
        let catalog = test_catalog();
        let bad = CALCHARO.replace("\"rank_type\":\"5\"", "\"rank_type\":\"4\"");
        let items = format!("{},{}", CALCHARO.replace("1716400000001", "x1"), bad);
        let err = decode(payload("v1.0", "", &items).as_bytes(), &catalog).expect_err("bad row");
        assert_eq!(
            err.validation().map(|cause| cause.field),
            Some(crate::error::RecordField::Rarity)
        );
        match err {
            LedgerError::Schema { row, .. } => assert_eq!(row, Some(2)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_rejects_disagreeing_category_codes() {
        let catalog = test_catalog();
        let item = CALCHARO.replace("\"gacha_type\":\"3\"", "\"gacha_type\":\"1\"");
        let err = decode(payload("v1.0", "", &item).as_bytes(), &catalog).expect_err("codes");
        assert!(matches!(err, LedgerError::Schema { .. }));
    }

    #[test]
    fn decode_accepts_numeric_fields() {
        let catalog = test_catalog();
        let item = r#"{"id":"9","name":"Danjin","count":1,"gacha_type":6,"item_id":1602,"item_type":"角色","rank_type":4,"time":"2024-05-23 10:00:00","uimf_gacha_type":6}"#;
        let batch = decode(payload("v1.0", "", item).as_bytes(), &catalog).expect("numbers");
        assert_eq!(batch.records[0].pool_category, PoolCategory::Beginner);
    }

    #[test]
    fn encode_then_decode_preserves_records() {
        let catalog = test_catalog();
        let items = format!(
            "{},{}",
            CALCHARO,
            r#"{"id":"","name":"Discord","count":"1","gacha_type":"4","item_id":"21010024","item_type":"武器","rank_type":"4","time":"2024-05-23 10:00:00","uimf_gacha_type":"4"}"#
        );
        let first = decode(payload("v1.0", "", &items).as_bytes(), &catalog).expect("decode");
        assert!(first.records[1].has_synthetic_id());

        let bytes = encode(&first.records, &meta("100000001")).expect("encode");
        let second = decode(&bytes, &catalog).expect("decode again");
        assert_eq!(second.records, first.records);
    }

    #[test]
    fn encode_emits_current_version_and_region_zone() {
        let record = Record {
            id: "1".to_string(),
            name: "Calcharo".to_string(),
            item_id: 1301,
            pool_category: PoolCategory::Beginner,
            item_type: crate::value_objects::ItemType::Character,
            rarity: crate::value_objects::Rarity::Five,
            time: parse_time("2024-05-23 10:00:00").expect("time"),
        };
        let export = build_export(&[record], &meta("600000001"));
        assert_eq!(export.info.uimf_version, UIMF_VERSION);
        assert_eq!(export.info.region_time_zone, Some(-5));
        assert_eq!(export.info.export_time, "2024-05-31 23:00:00");
        assert_eq!(export.list[0].gacha_type, "5");
        assert_eq!(export.list[0].uimf_gacha_type, "5");
        assert_eq!(export.list[0].item_type, "角色");
    }

    #[test]
    fn region_zone_follows_uid_prefix() {
        assert_eq!(region_time_zone("600000001"), -5);
        assert_eq!(region_time_zone("700000001"), 1);
        assert_eq!(region_time_zone("100000001"), 8);
    }

    #[test]
    fn export_file_name_uses_compact_timestamp() {
        let at = parse_time("2024-06-01 12:30:05").expect("time");
        assert_eq!(
            export_file_name(&PlayerId("42".to_string()), &at),
            "uimf_42_20240601123005.json"
        );
    }
}
