use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors the ledger can return.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("project name must not be empty")]
    EmptyName,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("milestone count must be at least 1")]
    InvalidMilestoneCount,
    #[error("project \"{0}\" not found")]
    ProjectNotFound(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn positive(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "{field} must be greater than 0, got {value}"
        )))
    }
}
