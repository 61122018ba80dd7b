//! Terminal presentation of the stored records: table state, debounced
//! search, chart series and the backend client they are fetched with.

pub mod chart;
pub mod client;
pub mod debounce;
pub mod state;

pub use client::ApiClient;
pub use debounce::Debouncer;
pub use state::{Action, FetchRequest, TableFilter, TableView, Transition};
