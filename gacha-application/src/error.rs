use gacha_domain::{ErrorCategory, LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
    #[error("live source error: {0}")]
    Source(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn storage(err: anyhow::Error) -> Self {
        AppError::Storage(err)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Unauthorized => ErrorCategory::Unauthorized,
            AppError::BadRequest(_) => ErrorCategory::InvalidRequest,
            AppError::Ledger(err) => err.category(),
            AppError::Storage(_) | AppError::Source(_) | AppError::Internal(_) => {
                ErrorCategory::TransientStorage
            }
        }
    }
}
