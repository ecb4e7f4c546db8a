//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `DomainDataSource` - Per-domain observations for a user and window
//! - `NarrativeGenerator` - Best-effort text for a connection
//! - `ConnectionStore` - Atomic replace and listing of a user's connections

mod connection_store;
mod domain_data_source;
mod narrative_generator;

pub use connection_store::ConnectionStore;
pub use domain_data_source::DomainDataSource;
pub use narrative_generator::{NarrativeError, NarrativeGenerator};
