//! PostgreSQL implementation of ConnectionStore.
//!
//! One row per connection with the record stored as JSONB. Replacement is a
//! single transaction (delete the user's rows, insert the new set), so a
//! failure at any point leaves the previous set in place.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::connections::Connection;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::ConnectionStore;

/// PostgreSQL implementation of ConnectionStore.
#[derive(Clone)]
pub struct PostgresConnectionStore {
    pool: PgPool,
}

impl PostgresConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl ConnectionStore for PostgresConnectionStore {
    async fn replace_connections(
        &self,
        user_id: &UserId,
        connections: &[Connection],
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query("DELETE FROM life_connections WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to clear connections", e))?;

        for connection in connections {
            sqlx::query(
                r#"
                INSERT INTO life_connections (id, user_id, connection, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(connection.id.as_uuid())
            .bind(user_id.as_str())
            .bind(Json(connection))
            .bind(connection.created_at.as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to insert connection", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(())
    }

    async fn list_connections(&self, user_id: &UserId) -> Result<Vec<Connection>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT connection FROM life_connections
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch connections", e))?;

        rows.into_iter()
            .map(|row| {
                row.try_get::<Json<Connection>, _>("connection")
                    .map(|json| json.0)
                    .map_err(|e| db_error("Failed to decode connection", e))
            })
            .collect()
    }
}
