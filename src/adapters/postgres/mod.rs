//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresConnectionStore` - Transactional replace of a user's connections
//! - `PostgresDomainDataSource` - Daily metrics read from `daily_metrics`

mod connection_store;
mod data_source;

pub use connection_store::PostgresConnectionStore;
pub use data_source::PostgresDomainDataSource;
