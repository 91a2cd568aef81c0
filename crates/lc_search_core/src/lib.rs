//! Land charges search core.
//!
//! The name canonicalization rules, the typed search dispatch, and the
//! request/result recording workflow, expressed over storage and
//! messaging port traits. Adapters live in `lc_search_postgres` and
//! `lc_search_amqp`.

pub mod error;
pub mod ports;
pub mod search_key;
pub mod service;
pub mod types;

pub use error::SearchError;
pub use service::{SearchOutcome, SearchService};
