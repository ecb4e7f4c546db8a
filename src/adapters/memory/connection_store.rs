//! In-memory connection store.
//!
//! Replacement swaps the whole per-user vector under one write lock, so
//! readers never observe a partially written set.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::connections::Connection;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::ConnectionStore;

#[derive(Debug, Default)]
pub struct InMemoryConnectionStore {
    connections: RwLock<HashMap<UserId, Vec<Connection>>>,
    fail_writes: AtomicBool,
    replace_count: AtomicUsize,
    write_delay: Duration,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every replacement before it touches stored data.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Makes `replace_connections` fail without touching stored data.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful replacements.
    pub fn replace_count(&self) -> usize {
        self.replace_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn replace_connections(
        &self,
        user_id: &UserId,
        connections: &[Connection],
    ) -> Result<(), DomainError> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated write failure",
            ));
        }
        self.connections
            .write()
            .await
            .insert(user_id.clone(), connections.to_vec());
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_connections(&self, user_id: &UserId) -> Result<Vec<Connection>, DomainError> {
        Ok(self
            .connections
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
