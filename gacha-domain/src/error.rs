// Ledger error taxonomy

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::formats::SourceFormat;
use crate::value_objects::PlayerId;

/// Record field a [`ValidationError`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Id,
    Name,
    PoolCategory,
    ItemId,
    ItemType,
    Rarity,
    Count,
    Time,
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordField::Id => "id",
            RecordField::Name => "name",
            RecordField::PoolCategory => "pool_category",
            RecordField::ItemId => "item_id",
            RecordField::ItemType => "item_type",
            RecordField::Rarity => "rarity",
            RecordField::Count => "count",
            RecordField::Time => "time",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} '{value}': {reason}")]
pub struct ValidationError {
    pub field: RecordField,
    pub value: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: RecordField, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Structural failure. `source` carries the field-level cause when a
    /// row failed record validation.
    #[error("schema error{}: {message}", .row.map(|r| format!(" at row {}", r)).unwrap_or_default())]
    Schema {
        row: Option<usize>,
        message: String,
        #[source]
        source: Option<ValidationError>,
    },
    #[error("format error: {0}")]
    Format(String),
    #[error("payload belongs to player {found}, expected {expected}")]
    IdentityMismatch { expected: PlayerId, found: String },
    #[error("history of player {player} already comes from {existing}, refusing {incoming} import")]
    MixedProvider {
        player: PlayerId,
        existing: SourceFormat,
        incoming: SourceFormat,
    },
    #[error("no history imported for player {0}")]
    NoHistory(PlayerId),
}

impl LedgerError {
    pub fn schema(row: Option<usize>, message: impl Into<String>) -> Self {
        LedgerError::Schema {
            row,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_row(row: usize, err: ValidationError) -> Self {
        LedgerError::Schema {
            row: Some(row),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Field-level cause, when the error came from record validation.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            LedgerError::Schema { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::Schema { .. } | LedgerError::Format(_) => {
                ErrorCategory::FormatInvalid
            }
            LedgerError::IdentityMismatch { .. } => ErrorCategory::IdentityMismatch,
            LedgerError::MixedProvider { .. } => ErrorCategory::AlreadyImportedByOtherProvider,
            LedgerError::NoHistory(_) => ErrorCategory::NoHistory,
        }
    }
}

/// One human-facing category per failure kind; localisation happens in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    FormatInvalid,
    IdentityMismatch,
    AlreadyImportedByOtherProvider,
    NoHistory,
    PartialMigrationFailure,
    TransientStorage,
    InvalidRequest,
    Unauthorized,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::FormatInvalid => "format_invalid",
            ErrorCategory::IdentityMismatch => "identity_mismatch",
            ErrorCategory::AlreadyImportedByOtherProvider => "already_imported_by_other_provider",
            ErrorCategory::NoHistory => "no_history",
            ErrorCategory::PartialMigrationFailure => "partial_migration_failure",
            ErrorCategory::TransientStorage => "transient_storage",
            ErrorCategory::InvalidRequest => "invalid_request",
            ErrorCategory::Unauthorized => "unauthorized",
        }
    }
}
