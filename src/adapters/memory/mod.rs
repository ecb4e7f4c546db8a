//! In-memory adapters for development and testing.

mod connection_store;
mod data_source;

pub use connection_store::InMemoryConnectionStore;
pub use data_source::InMemoryDomainDataSource;
