//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-memory data source and connection store
//! - `postgres` - sqlx-backed data source and connection store
//! - `narrative` - Narrative generators (Anthropic, mock)
//! - `http` - axum REST API

pub mod http;
pub mod memory;
pub mod narrative;
pub mod postgres;

pub use memory::{InMemoryConnectionStore, InMemoryDomainDataSource};
pub use narrative::{AnthropicNarrativeConfig, AnthropicNarrativeGenerator, MockNarrativeGenerator};
pub use postgres::{PostgresConnectionStore, PostgresDomainDataSource};
