//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, calendar helpers, and error types
//! that form the vocabulary of the Life Connections domain.

mod calendar;
mod errors;
mod ids;
mod timestamp;

pub use calendar::{coerce_date, DateRange, RawDate};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ConnectionId, DomainId, UserId};
pub use timestamp::Timestamp;
