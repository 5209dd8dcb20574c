/// Gateway error taxonomy
///
/// Connection failures and database-reported errors both arrive through sqlx;
/// the remaining variants are raised by the gateway itself before a statement
/// is issued.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, pool or database-reported failure (constraint violation, syntax, ...)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row could not be converted to or from its record shape
    #[error("row encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Column name from a row key is not a plain SQL identifier
    #[error("invalid column name: {0}")]
    InvalidColumn(String),

    /// Row passed to a write was not a JSON object
    #[error("row for table '{0}' must be a JSON object")]
    NotAnObject(String),

    /// Update targeted a row that does not exist
    #[error("no row with id '{id}' in table '{table}'")]
    NotFound { table: String, id: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;
