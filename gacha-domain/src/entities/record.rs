// Record entity
// One draw event, validated against the static catalog

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::entities::Catalog;
use crate::error::{RecordField, ValidationError};
use crate::utils::{format_time, local_time, parse_time};
use crate::value_objects::{ItemType, PoolCategory, Rarity};

/// Prefix marking ids derived from draw content instead of supplied by the source.
pub const SYNTHETIC_ID_PREFIX: &str = "syn-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub item_id: u32,
    pub pool_category: PoolCategory,
    pub item_type: ItemType,
    pub rarity: Rarity,
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
}

/// Untyped fields as a format adapter read them.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub id: Option<String>,
    pub name: String,
    pub pool_category: String,
    pub item_id: Option<String>,
    pub item_type: Option<String>,
    pub rarity: String,
    pub time: String,
    pub count: Option<String>,
}

impl Record {
    /// Checks every field against the catalog. Nothing is coerced: an unknown
    /// name, a mismatching type or rarity, or a sub-second time is rejected.
    pub fn validate(raw: RawRecord, catalog: &Catalog) -> Result<Record, ValidationError> {
        let time = parse_time(&raw.time).ok_or_else(|| {
            ValidationError::new(RecordField::Time, &raw.time, "expected YYYY-MM-DD HH:MM:SS")
        })?;
        let pool_category = PoolCategory::from_code(&raw.pool_category).ok_or_else(|| {
            ValidationError::new(RecordField::PoolCategory, &raw.pool_category, "unknown pool code")
        })?;
        let entry = catalog.lookup(&raw.name).ok_or_else(|| {
            ValidationError::new(RecordField::Name, &raw.name, "not in catalog")
        })?;

        if let Some(item_type) = raw.item_type.as_deref() {
            let parsed = ItemType::from_label(item_type).ok_or_else(|| {
                ValidationError::new(RecordField::ItemType, item_type, "unknown item type")
            })?;
            if parsed != entry.item_type {
                return Err(ValidationError::new(
                    RecordField::ItemType,
                    item_type,
                    format!("catalog lists {} as {}", entry.name, entry.item_type.as_str()),
                ));
            }
        }

        let rarity = Rarity::parse(&raw.rarity).ok_or_else(|| {
            ValidationError::new(RecordField::Rarity, &raw.rarity, "rarity must be 3, 4 or 5")
        })?;
        if rarity != entry.rarity {
            return Err(ValidationError::new(
                RecordField::Rarity,
                &raw.rarity,
                format!("catalog lists {} as {}★", entry.name, entry.rarity),
            ));
        }

        if let Some(item_id) = raw.item_id.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let parsed = item_id.parse::<u32>().map_err(|_| {
                ValidationError::new(RecordField::ItemId, item_id, "item id must be numeric")
            })?;
            match catalog.by_item_id(parsed) {
                Some(found) if found.item_id == entry.item_id => {}
                Some(found) => {
                    return Err(ValidationError::new(
                        RecordField::ItemId,
                        item_id,
                        format!("item id belongs to {}, not {}", found.name, entry.name),
                    ));
                }
                None => {
                    return Err(ValidationError::new(
                        RecordField::ItemId,
                        item_id,
                        format!("not in catalog; {} is {}", entry.name, entry.item_id),
                    ));
                }
            }
        }

        if let Some(count) = raw.count.as_deref() {
            if count.trim() != "1" {
                return Err(ValidationError::new(RecordField::Count, count, "count must be 1"));
            }
        }

        let id = match raw.id {
            Some(id) => {
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::new(RecordField::Id, id, "id must not be empty"));
                }
                trimmed.to_string()
            }
            None => synthetic_id(pool_category, &entry.name, &time, 0),
        };

        Ok(Record {
            id,
            name: entry.name.clone(),
            item_id: entry.item_id,
            pool_category,
            item_type: entry.item_type,
            rarity,
            time,
        })
    }

    pub fn has_synthetic_id(&self) -> bool {
        self.id.starts_with(SYNTHETIC_ID_PREFIX)
    }

    /// Content identity of a draw, independent of its id.
    pub fn fingerprint(&self) -> (&str, Rarity, NaiveDateTime) {
        (self.name.as_str(), self.rarity, self.time)
    }
}

/// Deterministic id for sources without stable identifiers.
///
/// `sha256("{code}|{name}|{time}|{ordinal}")`, first 16 bytes as lowercase hex,
/// prefixed with [`SYNTHETIC_ID_PREFIX`]. `ordinal` counts earlier identical
/// draws in the same batch, so a ten-pull with two copies of one item keeps
/// two distinct ids across re-imports.
pub fn synthetic_id(category: PoolCategory, name: &str, time: &NaiveDateTime, ordinal: usize) -> String {
    let payload = format!("{}|{}|{}|{}", category.code(), name, format_time(time), ordinal);
    let digest = Sha256::digest(payload.as_bytes());
    let mut out = String::with_capacity(SYNTHETIC_ID_PREFIX.len() + 32);
    out.push_str(SYNTHETIC_ID_PREFIX);
    for byte in digest.iter().take(16) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Hands out ordinals for [`synthetic_id`] while walking a batch in order.
#[derive(Debug, Default)]
pub struct SyntheticIdAllocator {
    seen: HashMap<(PoolCategory, String, NaiveDateTime), usize>,
}

impl SyntheticIdAllocator {
    pub fn next_id(&mut self, category: PoolCategory, name: &str, time: &NaiveDateTime) -> String {
        let ordinal = self
            .seen
            .entry((category, name.to_string(), *time))
            .or_insert(0);
        let id = synthetic_id(category, name, time, *ordinal);
        *ordinal += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::test_catalog;

    fn raw(name: &str, rarity: &str) -> RawRecord {
        RawRecord {
            id: Some("1717000000001".to_string()),
            name: name.to_string(),
            pool_category: "1".to_string(),
            item_id: None,
            item_type: Some("角色".to_string()),
            rarity: rarity.to_string(),
            time: "2024-05-23 10:00:00".to_string(),
            count: Some("1".to_string()),
        }
    }

    #[test]
    fn validate_resolves_alias_to_canonical_name() {
        let catalog = test_catalog();
        let record = Record::validate(raw("卡卡罗", "5"), &catalog).expect("valid record");
        assert_eq!(record.name, "Calcharo");
        assert_eq!(record.item_id, 1301);
        assert_eq!(record.pool_category, PoolCategory::Character);
        assert!(!record.has_synthetic_id());
    }

    #[test]
    fn validate_rejects_unknown_name_without_guessing() {
        let catalog = test_catalog();
        let err = Record::validate(raw("Calcharoo", "5"), &catalog).expect_err("unknown name");
        assert_eq!(err.field, RecordField::Name);
        assert_eq!(err.value, "Calcharoo");
    }

    #[test]
    fn validate_cross_checks_rarity_and_type() {
        let catalog = test_catalog();
        let err = Record::validate(raw("Calcharo", "4"), &catalog).expect_err("rarity mismatch");
        assert_eq!(err.field, RecordField::Rarity);

        let mut weapon_typed = raw("Calcharo", "5");
        weapon_typed.item_type = Some("武器".to_string());
        let err = Record::validate(weapon_typed, &catalog).expect_err("type mismatch");
        assert_eq!(err.field, RecordField::ItemType);

        let mut wrong_id = raw("Calcharo", "5");
        wrong_id.item_id = Some("1404".to_string());
        let err = Record::validate(wrong_id, &catalog).expect_err("item id mismatch");
        assert_eq!(err.field, RecordField::ItemId);
    }

    #[test]
    fn item_id_must_resolve_to_the_named_entry() {
        let catalog = test_catalog();
        let mut matching = raw("Calcharo", "5");
        matching.item_id = Some(" 1301 ".to_string());
        assert_eq!(Record::validate(matching, &catalog).expect("valid").item_id, 1301);

        let mut other = raw("Calcharo", "5");
        other.item_id = Some("1404".to_string());
        let err = Record::validate(other, &catalog).expect_err("other entry");
        assert!(err.reason.contains("Jiyan"), "{}", err.reason);

        let mut unknown = raw("Calcharo", "5");
        unknown.item_id = Some("999999".to_string());
        let err = Record::validate(unknown, &catalog).expect_err("unknown id");
        assert_eq!(err.field, RecordField::ItemId);
        assert_eq!(err.value, "999999");

        let mut garbage = raw("Calcharo", "5");
        garbage.item_id = Some("13x1".to_string());
        assert_eq!(
            Record::validate(garbage, &catalog).expect_err("non-numeric").field,
            RecordField::ItemId
        );
    }

    #[test]
    fn validate_rejects_bad_time_and_count() {
        let catalog = test_catalog();
        let mut bad_time = raw("Calcharo", "5");
        bad_time.time = "2024-05-23 10:00:00.500".to_string();
        assert_eq!(
            Record::validate(bad_time, &catalog).expect_err("time").field,
            RecordField::Time
        );

        let mut bad_count = raw("Calcharo", "5");
        bad_count.count = Some("10".to_string());
        assert_eq!(
            Record::validate(bad_count, &catalog).expect_err("count").field,
            RecordField::Count
        );
    }

    #[test]
    fn missing_id_is_synthesized_deterministically() {
        let catalog = test_catalog();
        let mut first = raw("Calcharo", "5");
        first.id = None;
        let a = Record::validate(first.clone(), &catalog).expect("record");
        let b = Record::validate(first, &catalog).expect("record");
        assert!(a.has_synthetic_id());
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), SYNTHETIC_ID_PREFIX.len() + 32);
    }

    #[test]
    fn allocator_separates_identical_draws() {
        let time = parse_time("2024-05-23 10:00:00").expect("time");
        let mut allocator = SyntheticIdAllocator::default();
        let first = allocator.next_id(PoolCategory::Standard, "Sword of Night", &time);
        let second = allocator.next_id(PoolCategory::Standard, "Sword of Night", &time);
        assert_ne!(first, second);
        assert_eq!(first, synthetic_id(PoolCategory::Standard, "Sword of Night", &time, 0));
        assert_ne!(
            first,
            synthetic_id(PoolCategory::Character, "Sword of Night", &time, 0)
        );
    }
}
