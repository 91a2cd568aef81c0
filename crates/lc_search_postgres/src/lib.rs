//! PostgreSQL adapters for the land charges search ports.

pub mod store;

pub use store::{PgCountyKeyStore, PgRegisterStore, PgSearchStore, PgStores};
