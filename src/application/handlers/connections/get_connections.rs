//! GetConnectionsHandler - Query handler for a user's stored connections.

use std::sync::Arc;

use crate::domain::connections::Connection;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::ConnectionStore;

/// Query for the connections of one user.
#[derive(Debug, Clone)]
pub struct GetConnectionsQuery {
    pub user_id: UserId,
}

pub struct GetConnectionsHandler {
    store: Arc<dyn ConnectionStore>,
}

impl GetConnectionsHandler {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// Strongest first, whatever order the store returns.
    pub async fn handle(&self, query: GetConnectionsQuery) -> Result<Vec<Connection>, DomainError> {
        let mut connections = self.store.list_connections(&query.user_id).await?;
        connections.sort_by(|x, y| {
            y.metrics
                .coefficient
                .abs()
                .total_cmp(&x.metrics.coefficient.abs())
        });
        Ok(connections)
    }
}
