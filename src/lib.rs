//! Life Connections - Cross-domain correlation engine
//!
//! Finds statistically supported, explainable relationships between a
//! person's daily metrics from different life domains (sleep, activities,
//! mood, photos, steps, ...) and stores them as connection records.
//!
//! - `domain` - pure statistics pipeline and value types
//! - `ports` - data source, narrative generator and connection store contracts
//! - `adapters` - in-memory, PostgreSQL, Anthropic and HTTP implementations
//! - `application` - the analysis and read handlers
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
