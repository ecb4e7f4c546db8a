//! Connection store port.
//!
//! Each analysis run produces the complete connection set for a user, so
//! the store only offers whole-set replacement and listing.

use async_trait::async_trait;

use crate::domain::connections::Connection;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Atomically replaces the user's connections with `connections`.
    ///
    /// Readers see either the previous set or the new one, never a mix.
    /// On error the previous set is left untouched.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn replace_connections(
        &self,
        user_id: &UserId,
        connections: &[Connection],
    ) -> Result<(), DomainError>;

    /// The user's current connections, in no particular order.
    async fn list_connections(&self, user_id: &UserId) -> Result<Vec<Connection>, DomainError>;
}
