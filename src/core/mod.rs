//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod import;
pub mod log;
pub mod query;
pub mod record;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{ImportError, LookupError, QueryError};
pub use import::{ImportSummary, Importer};
pub use query::{CurrencyList, PageEnvelope, QueryService, RawReadParams, ReadParams};
pub use record::StockRecord;
pub use store::{RecordFilter, RecordStore, SortOrder, SortSpec, StoreError, Window};
