use thiserror::Error;

/// Errors surfaced by [`crate::local_store::LocalStore`] and the query helpers.
///
/// Lookups of missing records are not errors: they come back as `Ok(None)` or
/// `Ok(false)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] lmdb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    #[error("store has been closed")]
    Closed,
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
