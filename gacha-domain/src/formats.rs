// Format adapters
// Raw payloads -> canonical records, selected by an explicit marker up front

pub mod interchange;
pub mod legacy;
pub mod live;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Catalog, Record, SyntheticIdAllocator};
use crate::error::LedgerError;
use crate::value_objects::{PlayerId, PoolCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Interchange,
    Legacy,
    LiveApi,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Interchange => "interchange",
            SourceFormat::Legacy => "legacy",
            SourceFormat::LiveApi => "live_api",
        }
    }

    /// Whether records of this format carry identifiers stable across exports.
    pub fn has_stable_ids(&self) -> bool {
        !matches!(self, SourceFormat::Legacy)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one adapter decode: records in chronological order plus the
/// identity the payload claims to belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBatch {
    pub format: SourceFormat,
    pub player_id: Option<String>,
    pub records: Vec<Record>,
    pub skipped: usize,
}

impl DecodedBatch {
    /// Fails with `IdentityMismatch` when the payload names another player.
    pub fn check_identity(&self, expected: &PlayerId) -> Result<(), LedgerError> {
        match self.player_id.as_deref().map(str::trim) {
            Some(found) if !found.is_empty() && found != expected.as_str() => {
                Err(LedgerError::IdentityMismatch {
                    expected: expected.clone(),
                    found: found.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Splits the batch per category, keeping batch order inside each.
    pub fn by_category(&self) -> BTreeMap<PoolCategory, Vec<Record>> {
        let mut grouped: BTreeMap<PoolCategory, Vec<Record>> = BTreeMap::new();
        for record in &self.records {
            grouped
                .entry(record.pool_category)
                .or_default()
                .push(record.clone());
        }
        grouped
    }
}

/// Picks the adapter for an uploaded file. The interchange envelope is
/// recognised by its version marker; the legacy table, which has no marker,
/// by its `columns`/`rows` shape.
pub fn detect(bytes: &[u8]) -> Result<SourceFormat, LedgerError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| LedgerError::Format(format!("payload is not JSON: {}", err)))?;
    let object = value
        .as_object()
        .ok_or_else(|| LedgerError::Format("payload is not a JSON object".to_string()))?;

    if object
        .get("info")
        .and_then(|info| info.get("uimf_version"))
        .is_some()
    {
        return Ok(SourceFormat::Interchange);
    }
    let is_array = |key: &str| object.get(key).map(Value::is_array).unwrap_or(false);
    if is_array("columns") && is_array("rows") {
        return Ok(SourceFormat::Legacy);
    }
    Err(LedgerError::Format(
        "unrecognised import file: no uimf_version marker and no legacy table".to_string(),
    ))
}

/// Decodes an uploaded file with the adapter [`detect`] selects.
pub fn decode_file(bytes: &[u8], catalog: &Catalog) -> Result<DecodedBatch, LedgerError> {
    match detect(bytes)? {
        SourceFormat::Interchange => interchange::decode(bytes, catalog),
        SourceFormat::Legacy => legacy::decode(bytes, catalog),
        SourceFormat::LiveApi => Err(LedgerError::Format(
            "live API responses are imported through the live source".to_string(),
        )),
    }
}

/// A validated row still waiting for its final id.
pub(crate) struct PendingRecord {
    pub record: Record,
    pub synthesize_id: bool,
}

/// Orients rows chronologically and hands out synthetic ids in that order,
/// so re-decoding the same rows yields the same ids.
pub(crate) fn settle(mut rows: Vec<PendingRecord>, allocator: &mut SyntheticIdAllocator) -> Vec<Record> {
    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        if first.record.time > last.record.time {
            rows.reverse();
        }
    }
    rows.sort_by_key(|row| row.record.time);
    rows.into_iter()
        .map(|row| {
            let mut record = row.record;
            if row.synthesize_id {
                record.id = allocator.next_id(record.pool_category, &record.name, &record.time);
            }
            record
        })
        .collect()
}

/// Reads a JSON scalar the way spreadsheet-ish exporters write it.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
