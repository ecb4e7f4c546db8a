//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, calendar, timestamps, errors)
//! - `connections` - Cross-domain correlation engine (pure, stateless)

pub mod connections;
pub mod foundation;
