use crate::core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The upload is not JSON, or not shaped like a search result envelope.
    #[error("Invalid JSON file content!")]
    InvalidFormat,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The currency lookup failed. The cause is logged, not carried.
#[derive(Debug, Error)]
#[error("An error occurred while fetching data.")]
pub struct LookupError;
